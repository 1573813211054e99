use recipedb_core::{EmbeddingStore, HnswConfig, HnswIndex, Result};
use std::path::Path;
use std::sync::Arc;

/// Loads the graph at `path`, or builds it with `config` and saves it there.
///
/// An existing artifact is trusted only if it matches `store`; a mismatch or
/// corruption is returned as an error rather than silently rebuilt.
pub fn load_or_build(
    store: Arc<EmbeddingStore>,
    path: &Path,
    config: HnswConfig,
) -> Result<HnswIndex> {
    if path.exists() {
        return HnswIndex::load(path, store);
    }
    tracing::info!(
        "No index at {:?}; building over {} vectors (M={}, ef_construction={})",
        path,
        store.len(),
        config.m,
        config.ef_construction
    );
    let index = HnswIndex::build(store, config)?;
    index.save(path)?;
    Ok(index)
}

/// Builds the graph unconditionally and overwrites `path`.
pub fn rebuild(store: Arc<EmbeddingStore>, path: &Path, config: HnswConfig) -> Result<HnswIndex> {
    let index = HnswIndex::build(store, config)?;
    index.save(path)?;
    Ok(index)
}
