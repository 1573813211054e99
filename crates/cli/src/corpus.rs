use recipedb_core::{Embedder, EmbeddingStore, Error, RecipeCatalog, Result};
use std::path::Path;

const PROGRESS_EVERY: usize = 1000;

/// Embeds every recipe's search text, in catalog order, so vector `i` belongs to recipe `i`.
///
/// The first embedding fixes the dimension; a later vector of another length
/// fails with `DimensionMismatch`.
pub fn embed_catalog<E: Embedder>(catalog: &RecipeCatalog, embedder: &E) -> Result<EmbeddingStore> {
    let mut store: Option<EmbeddingStore> = None;
    for (i, recipe) in catalog.iter().enumerate() {
        let vector = embedder
            .embed(&recipe.search_text())
            .map_err(|e| Error::EmbeddingUnavailable(format!("recipe {i}: {e}")))?;
        let store = match store.as_mut() {
            Some(store) => store,
            None => store.insert(EmbeddingStore::new(vector.len())?),
        };
        store.push(&vector)?;
        if (i + 1) % PROGRESS_EVERY == 0 {
            tracing::info!("Embedded {}/{} recipes", i + 1, catalog.len());
        }
    }
    store.ok_or_else(|| Error::InvalidConfig("recipe catalog is empty".into()))
}

/// Embeds the catalog and writes the embedding file atomically.
pub fn write_embeddings<E: Embedder>(
    catalog: &RecipeCatalog,
    embedder: &E,
    path: &Path,
) -> Result<EmbeddingStore> {
    let store = embed_catalog(catalog, embedder)?;
    store.save(path)?;
    Ok(store)
}
