//! # recipedb-core
//!
//! Semantic recipe search: an in-memory embedding store, an HNSW approximate
//! nearest neighbor graph built over it, and a query pipeline that turns text
//! into ranked recipes.
//!
//! The library is synchronous and has no network dependencies. Embedding
//! models and metadata sources plug in through traits in [`pipeline`].

/// Global configuration constants: file formats, defaults, and presentation limits.
pub mod config;
/// Error type shared by every fallible operation in the crate.
pub mod error;
/// HNSW approximate nearest neighbor index: graph structure, search, insertion, and distance metrics.
pub mod hnsw;
/// Query pipeline: embedder and metadata traits, ranked results, and the swappable index handle.
pub mod pipeline;
/// Recipe records and the JSON-backed catalog.
pub mod recipe;
/// Storage layer: embedding store codec and graph artifact persistence.
pub mod storage;

pub use error::{Error, Result};
pub use hnsw::{DistanceMetric, HnswConfig, HnswIndex, IndexStats, Neighbor};
pub use pipeline::{EmbedError, Embedder, IndexHandle, MetadataSource, QueryPipeline, RankedResult};
pub use recipe::{Recipe, RecipeCatalog};
pub use storage::EmbeddingStore;
