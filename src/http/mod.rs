//! HTTP plumbing shared by every client
//!
//! - [`transport`] - request construction and the single round trip
//! - [`response`] - strict interpretation of raw responses

pub mod response;
pub mod transport;

pub use response::{read_body_as_json, read_location_header, RawResponse};
pub use transport::{extend_url, ApiRequest, Auth, HttpTransport, RequestBody, DEFAULT_TIMEOUT};
