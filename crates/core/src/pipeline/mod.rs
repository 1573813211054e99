//! Query pipeline: text → embedding → HNSW search → ranked results with metadata.
//!
//! The embedding model and the metadata source are external collaborators,
//! injected through the [`Embedder`] and [`MetadataSource`] traits. The index
//! is read through an [`IndexHandle`], so a rebuilt graph can be swapped in
//! while queries are running.

/// Shared, swappable reference to the current index.
pub mod handle;

pub use handle::IndexHandle;

use crate::error::{Error, Result};
use crate::hnsw::{DistanceMetric, HnswIndex, Neighbor};
use serde::Serialize;

/// Error type returned by embedding backends.
pub type EmbedError = Box<dyn std::error::Error + Send + Sync>;

/// Turns query text into a vector in the same space as the indexed embeddings.
pub trait Embedder {
    fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbedError>;
}

impl<F> Embedder for F
where
    F: Fn(&str) -> std::result::Result<Vec<f32>, EmbedError>,
{
    fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbedError> {
        self(text)
    }
}

/// Lookup of the record stored under an embedding id.
pub trait MetadataSource {
    type Record;

    fn metadata(&self, id: u32) -> Option<Self::Record>;
}

/// One ranked hit. `rank` starts at 1; `score` is a similarity (higher = closer).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult<R> {
    pub rank: usize,
    pub id: u32,
    pub score: f32,
    pub distance: f32,
    /// `None` when the metadata source has no record for `id`.
    pub record: Option<R>,
}

/// Converts a metric distance into a similarity score.
pub fn score_from_distance(metric: DistanceMetric, distance: f32) -> f32 {
    match metric {
        DistanceMetric::Cosine => 1.0 - distance,
        DistanceMetric::Euclidean | DistanceMetric::DotProduct => -distance,
    }
}

pub struct QueryPipeline<E, M> {
    index: IndexHandle,
    embedder: E,
    metadata: M,
    ef: Option<usize>,
}

impl<E: Embedder, M: MetadataSource> QueryPipeline<E, M> {
    pub fn new(index: IndexHandle, embedder: E, metadata: M) -> Self {
        Self {
            index,
            embedder,
            metadata,
            ef: None,
        }
    }

    /// Overrides the index's configured `ef_search`.
    pub fn with_ef(mut self, ef: usize) -> Self {
        self.ef = Some(ef);
        self
    }

    pub fn index(&self) -> &IndexHandle {
        &self.index
    }

    pub fn metadata_source(&self) -> &M {
        &self.metadata
    }

    /// Embeds `text` and returns the `k` closest records.
    pub fn query_by_text(&self, text: &str, k: usize) -> Result<Vec<RankedResult<M::Record>>> {
        let vector = self
            .embedder
            .embed(text)
            .map_err(|e| Error::EmbeddingUnavailable(e.to_string()))?;
        self.query_by_vector(&vector, k)
    }

    pub fn query_by_vector(&self, vector: &[f32], k: usize) -> Result<Vec<RankedResult<M::Record>>> {
        let index = self.index.current();
        let hits = index.search(vector, k, self.ef_for(&index))?;
        Ok(self.rank(&index, hits))
    }

    /// The `k` records closest to an already indexed item. The item itself is
    /// not filtered out and normally ranks first.
    pub fn more_like(&self, id: u32, k: usize) -> Result<Vec<RankedResult<M::Record>>> {
        let index = self.index.current();
        let vector = index.store().get(id as usize)?;
        let hits = index.search(vector, k, self.ef_for(&index))?;
        Ok(self.rank(&index, hits))
    }

    fn ef_for(&self, index: &HnswIndex) -> usize {
        self.ef.unwrap_or(index.config().ef_search)
    }

    fn rank(&self, index: &HnswIndex, hits: Vec<Neighbor>) -> Vec<RankedResult<M::Record>> {
        let metric = index.config().distance_metric;
        hits.into_iter()
            .enumerate()
            .map(|(i, hit)| {
                let record = self.metadata.metadata(hit.id);
                if record.is_none() {
                    tracing::warn!("No metadata for id {}", hit.id);
                }
                RankedResult {
                    rank: i + 1,
                    id: hit.id,
                    score: score_from_distance(metric, hit.distance),
                    distance: hit.distance,
                    record,
                }
            })
            .collect()
    }
}
