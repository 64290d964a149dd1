//! Storage-collaborator capability interface.
//!
//! The protocol layer carries operation payloads as opaque, pre-serialized
//! byte blocks; their codec belongs to the storage layer. To reconstruct a
//! logical operation ("statement") from a data-operation request, the
//! storage layer implements this narrow capability: decode a payload into
//! an operation view, and report which time-series paths the view affects.
//! The protocol stays decoupled from the set of operation types.

/// Shape of an opaque operation payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// A serialized insert-node plan.
    InsertNode,
    /// A serialized schema plan.
    SchemaPlan,
    /// Serialized raw tabular data plus its aligned flag.
    TabletRaw,
}

/// Capability the storage layer provides to the protocol layer.
pub trait StorageCodec {
    /// Decoded operation view.
    type View;
    /// Time-series path type.
    type Path;
    /// Storage-side decode failure.
    type Error;

    /// Deserializes an opaque payload into an operation view.
    ///
    /// For [`OperationKind::TabletRaw`] the implementation must sort rows by
    /// timestamp (stable, ties keeping insertion order) before the view is
    /// returned, because downstream statement construction assumes
    /// timestamp-ordered rows.
    fn decode_payload(&self, kind: OperationKind, payload: &[u8]) -> Result<Self::View, Self::Error>;

    /// Returns the time-series paths affected by an operation view.
    fn affected_paths(&self, view: &Self::View) -> Vec<Self::Path>;
}

/// A reconstructed logical operation.
///
/// Computed on demand when the execution layer asks for it; the protocol
/// layer never caches statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement<V, P> {
    /// The decoded operation.
    pub operation: V,
    /// Time-series paths the operation affects.
    pub paths: Vec<P>,
}
