//! # tspipe-model
//!
//! Time-series operation model for the tspipe replication pathway.
//!
//! This crate provides:
//! - Time-series paths and measurement data types
//! - The operation shapes the pipe ships as opaque payloads: raw tablets,
//!   insert-row nodes and schema plans, with their binary codecs
//! - [`PipeCodec`], the storage-side implementation of the protocol's
//!   `StorageCodec` capability, used to reconstruct statements from
//!   payloads

pub mod codec;
pub mod error;
pub mod insert;
pub mod path;
pub mod schema;
pub mod tablet;
pub mod types;

pub use codec::{OperationView, PipeCodec};
pub use error::ModelError;
pub use insert::InsertRowNode;
pub use path::Path;
pub use schema::SchemaPlanNode;
pub use tablet::{ColumnSchema, Tablet};
pub use types::{DataType, Value};
