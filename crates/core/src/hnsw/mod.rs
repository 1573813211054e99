//! Hierarchical Navigable Small World (HNSW) approximate nearest neighbor index.
//!
//! The graph is built once over an [`EmbeddingStore`](crate::storage::EmbeddingStore)
//! and is read-only afterwards. Nodes are dense integer ids into the store;
//! per-node layer assignments and neighbor lists live in parallel arrays, so
//! there are no pointer cycles to manage.

/// Distance metrics: cosine, euclidean, and dot product.
pub mod distance;
/// HNSW graph structure, configuration, and build entry point.
pub mod graph;
/// HNSW insertion algorithm with bidirectional connections and heuristic pruning.
pub mod insert;
/// HNSW search: greedy descent, single-layer beam search, multi-layer KNN.
pub mod search;
/// Structural statistics (layer sizes, degrees, reachability).
pub mod stats;
/// Epoch-stamped visited set for graph traversal.
pub mod visited;

pub use distance::DistanceMetric;
pub use graph::{HnswConfig, HnswIndex};
pub use search::{knn_search, Neighbor};
pub use stats::IndexStats;
