//! recipedb-cli: command-line driver for recipe search.
//!
//! Embeds the recipe corpus, builds the HNSW graph over the embedding file,
//! prints graph statistics, and runs an interactive query loop against an HTTP
//! embedding endpoint. All index logic lives in `recipedb-core`.

/// Corpus embedding: recipe search text to embedding file.
pub mod corpus;
/// HTTP client implementing the core `Embedder` trait.
pub mod embedder;
/// Load-or-build of the graph artifact.
pub mod index;
/// Text rendering of ranked results.
pub mod present;
/// Line-oriented interactive query loop.
pub mod repl;
