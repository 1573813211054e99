//! Error type shared by every public operation in the core.
//!
//! Errors are detected synchronously at the call that violates the contract
//! and are never retried internally.

/// Errors produced by the embedding store, the HNSW index and the query pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A vector's length differs from the store/index dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The embedding artifact's length disagrees with its header (sizes in bytes).
    #[error("truncated embedding file: expected {expected} bytes, found {actual}")]
    TruncatedFile { expected: usize, actual: usize },

    /// The embedding artifact's header declares an impossible shape.
    #[error("invalid embedding header: {0}")]
    InvalidHeader(String),

    /// A vector id outside `0..len`.
    #[error("id {id} out of range (len {len})")]
    IdOutOfRange { id: usize, len: usize },

    /// Search against an index with no nodes.
    #[error("index is empty")]
    EmptyIndex,

    /// A persisted graph artifact failed structural validation.
    #[error("corrupt index artifact: {0}")]
    CorruptArtifact(String),

    /// The external embedding function failed.
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Build parameters that cannot produce a valid graph.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The recipe catalog is not a JSON array of recipe objects.
    #[error("malformed recipe catalog: {0}")]
    MalformedCatalog(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
