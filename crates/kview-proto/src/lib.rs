//! # kview-proto
//!
//! Wire schema for the kview publisher protocol: the workload object types
//! carried by snapshot frames, frame decoding, and schema validation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod snapshot;
pub mod types;

pub use error::ProtoError;
pub use snapshot::ClusterSnapshot;
pub use types::{
    ConfigMap, Deployment, NamespaceView, Pod, Secret, Service, parse_timestamp,
};
