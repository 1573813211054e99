//! Global configuration constants for recipedb.
//!
//! Index tuning defaults, artifact format markers and presentation limits are
//! defined here. Runtime configuration is carried by [`HnswConfig`] and by the
//! CLI arguments of `recipe-search`.
//!
//! [`HnswConfig`]: crate::hnsw::HnswConfig

/// Default number of bidirectional links per HNSW node above layer 0.
///
/// Layer 0 allows twice as many. Typical range: 8–64.
pub const HNSW_DEFAULT_M: usize = 16;

/// Default ef parameter during HNSW index construction.
///
/// Controls the size of the dynamic candidate list during insertion.
/// Higher values produce a better graph but slow down build time.
pub const HNSW_DEFAULT_EF_CONSTRUCTION: usize = 200;

/// Default ef parameter during HNSW search.
///
/// Controls the size of the dynamic candidate list during query.
/// Higher values improve recall at the cost of latency. Always raised to `k`.
pub const HNSW_DEFAULT_EF_SEARCH: usize = 50;

/// Maximum number of layers in the HNSW graph.
pub const HNSW_DEFAULT_MAX_LAYERS: usize = 16;

/// Seed for the layer-assignment RNG when none is supplied.
pub const HNSW_DEFAULT_SEED: u64 = 0x5eed_2024;

/// Default number of results returned by the query pipeline.
pub const DEFAULT_K: usize = 5;

/// Size in bytes of the embedding artifact header (`i32` count, `i32` dimension).
pub const EMBEDDING_HEADER_BYTES: usize = 8;

/// Magic bytes at the start of every graph snapshot payload.
pub const GRAPH_MAGIC: [u8; 4] = *b"RGRF";

/// Graph snapshot format version. Bump on any layout change.
pub const GRAPH_FORMAT_VERSION: u32 = 1;

/// Magic bytes placed before the CRC32 footer of a graph artifact.
pub const GRAPH_CRC_MAGIC: &[u8; 4] = b"RGI1";

/// Maximum characters of recipe text handed to the embedding model.
pub const EMBED_TEXT_MAX_CHARS: usize = 2000;

/// Maximum number of ingredients folded into a recipe's search text.
pub const EMBED_MAX_INGREDIENTS: usize = 10;

/// Description preview length when presenting results.
pub const DESCRIPTION_PREVIEW_CHARS: usize = 150;

/// Inputs that end an interactive query session.
pub const EXIT_COMMANDS: [&str; 3] = ["quit", "exit", "q"];

// Default file locations, relative to the working directory.
pub const DEFAULT_EMBEDDINGS_PATH: &str = "recipe_embeddings.bin";
pub const DEFAULT_INDEX_PATH: &str = "recipe_index.bin";
pub const DEFAULT_RECIPES_PATH: &str = "allrecipes.json";

/// Request timeout for the HTTP embedding endpoint.
pub const DEFAULT_EMBED_TIMEOUT_SECS: u64 = 30;
