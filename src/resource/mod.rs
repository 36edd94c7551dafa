//! Resource abstraction layer
//!
//! This module provides a data-driven approach to inventory resources.
//! Collection descriptors are loaded from JSON files at compile time, so a
//! new resource type is a registry entry, not a new client type.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches resource descriptors from embedded JSON
//! - [`record`] - Records and relation-field normalization
//! - [`client`] - Generic CRUD client over one collection
//! - [`lookup`] - List envelopes and unique-field disambiguation
//! - [`automation`] - Build / dry-run / teardown protocol
//!
//! # Resource Definitions
//!
//! Resources are defined in JSON files under `src/resources/`:
//! - `virtualization.json` - clusters, virtual machines, VPCs, transit gateways, ...
//! - `automation.json` - automation contexts and their processes
//!
//! # Example
//!
//! ```ignore
//! use infractl::resource::{get_resource, ResourceClient};
//!
//! async fn find_cluster(transport: HttpTransport) -> Result<Option<Record>, ClientError> {
//!     let descriptor = get_resource("virtualization.clusters").unwrap().clone();
//!     ResourceClient::new(transport, descriptor)?.get_by_name("edge-1").await
//! }
//! ```

pub mod automation;
pub mod client;
pub mod lookup;
pub mod record;
pub mod registry;

pub use automation::{
    interpret_build, interpret_teardown, Automation, BuildOutcome, DryRunPreview,
    OperationHandle, OperationProtocol,
};
pub use client::{Page, ResourceClient};
pub use lookup::{select_unique, ListEnvelope};
pub use record::{normalize_record, normalize_relation, record_id, Direction, Record, RelationField, RelationShape};
pub use registry::*;
