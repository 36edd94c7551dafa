//! # infractl
//!
//! Async client for an inventory service (virtualization resources, automation
//! contexts) and a catalog service (descriptor templates).
//!
//! - Every resource collection is served by one generic [`ResourceClient`],
//!   configured by a data-driven [`ResourceDescriptor`].
//! - Unique lookups return zero or one record; more is an
//!   [`ClientError::AmbiguousMatch`].
//! - Build and teardown return an [`OperationHandle`] taken from the
//!   `Location` header, or a [`DryRunPreview`] on dry runs. Polling is up to
//!   the caller.
//!
//! ## Example
//!
//! ```ignore
//! use infractl::{ClientError, InventoryClient};
//! use std::time::Duration;
//!
//! async fn rebuild(name: &str) -> Result<(), ClientError> {
//!     let client = InventoryClient::new("https://sp.example.com", Some("token"), Duration::from_secs(30))?;
//!     let clusters = client.virtualization().clusters()?;
//!     if let Some(cluster) = clusters.get_by_name(name).await? {
//!         let id = infractl::resource::record_id(&cluster).unwrap_or_default();
//!         let handle = clusters.build(&id).await?;
//!         println!("build started: {handle}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod resource;

pub use catalog::DescriptorTemplates;
pub use client::{AutomationGroup, CatalogClient, InventoryClient, VirtualizationGroup};
pub use config::{Config, ServiceConfig};
pub use error::{format_client_error, ClientError};
pub use http::{Auth, HttpTransport, RawResponse};
pub use resource::{
    BuildOutcome, DryRunPreview, OperationHandle, OperationProtocol, Page, Record,
    ResourceClient, ResourceDescriptor,
};
