//! # tspipe-receiver
//!
//! Receiver side of the tspipe replication pathway: the per-resource
//! transfer state machine and the dispatch point that turns inbound
//! envelopes into replies.
//!
//! [`PipeReceiver`] parses each envelope through the protocol layer,
//! enforces the handshake gate, stages chunked file and snapshot transfers
//! through [`ResourceWriter`], and hands data payloads to the embedding
//! storage layer via the [`OperationSink`] trait. Recoverable conditions
//! (rejected handshakes, offset gaps, seal mismatches) travel back to the
//! sender as statuses; only malformed input and local faults surface as
//! [`ReceiverError`].

pub mod error;
pub mod receiver;
pub mod resource;

pub use error::ReceiverError;
pub use receiver::{OperationSink, PipeReceiver, PipeResponse, ReceiverConfig};
pub use resource::{ResourceState, ResourceWriter, SealedMeta};
