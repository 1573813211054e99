//! Storage layer: the embedding store and on-disk graph artifacts.
//!
//! Embeddings use a fixed little-endian layout shared with the offline
//! embedding generator. Graphs are bincode snapshots with a CRC32 footer.
//! Every file write is atomic (temp file + rename).

/// Dense vector store and its binary codec.
pub mod embeddings;
/// Graph artifact save/load with integrity checks and atomic writes.
pub mod persistence;

pub use embeddings::EmbeddingStore;
pub use persistence::{decode_index, encode_index, load_index, save_index};
