//! HNSW graph structure and configuration.
//!
//! [`HnswConfig`] defines tuning parameters (M, ef_construction, ef_search, distance metric).
//! [`HnswIndex`] stores the graph using a Struct-of-Arrays layout: per-node layer
//! assignments and neighbor lists indexed by dense id. Vectors are not copied;
//! they are read from the shared [`EmbeddingStore`] the index was built over.

use crate::config;
use crate::error::{Error, Result};
use crate::hnsw::distance::{inverse_norm, DistanceMetric};
use crate::hnsw::stats::IndexStats;
use crate::hnsw::visited::VisitedSet;
use crate::storage::EmbeddingStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Configuration parameters for an HNSW index.
///
/// Controls the trade-off between build speed, search speed, recall, and memory usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HnswConfig {
    /// Number of bidirectional links per node (except layer 0, which uses `m_max0`, at most `2 * m`).
    pub m: usize,
    /// Maximum links per node at layer 0 (typically `2 * m`).
    pub m_max0: usize,
    /// Candidate list size during index construction.
    pub ef_construction: usize,
    /// Default candidate list size during search (higher = better recall, slower).
    pub ef_search: usize,
    /// Maximum number of layers in the graph.
    pub max_layers: usize,
    /// Distance function for similarity computation.
    pub distance_metric: DistanceMetric,
    /// Seed for layer assignment. Same corpus + same seed = same graph.
    pub seed: u64,
    /// Back-fill neighbor slots the diversity heuristic left empty with the
    /// closest rejected candidates.
    #[serde(default)]
    pub keep_pruned_connections: bool,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            m: config::HNSW_DEFAULT_M,
            m_max0: config::HNSW_DEFAULT_M * 2,
            ef_construction: config::HNSW_DEFAULT_EF_CONSTRUCTION,
            ef_search: config::HNSW_DEFAULT_EF_SEARCH,
            max_layers: config::HNSW_DEFAULT_MAX_LAYERS,
            distance_metric: DistanceMetric::Cosine,
            seed: config::HNSW_DEFAULT_SEED,
            keep_pruned_connections: false,
        }
    }
}

impl HnswConfig {
    /// Default configuration with the given `M` (layer 0 gets `2 * M`).
    pub fn with_m(m: usize) -> Self {
        Self {
            m,
            m_max0: m * 2,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.m < 2 {
            return Err(Error::InvalidConfig(format!("m must be >= 2, got {}", self.m)));
        }
        if self.m_max0 < self.m || self.m_max0 > 2 * self.m {
            return Err(Error::InvalidConfig(format!(
                "m_max0 ({}) must be in m..=2*m ({}..={})",
                self.m_max0,
                self.m,
                2 * self.m
            )));
        }
        if self.ef_construction == 0 {
            return Err(Error::InvalidConfig("ef_construction must be >= 1".into()));
        }
        if self.max_layers == 0 || self.max_layers > u8::MAX as usize + 1 {
            return Err(Error::InvalidConfig(format!(
                "max_layers must be in 1..=256, got {}",
                self.max_layers
            )));
        }
        Ok(())
    }
}

/// HNSW index over an [`EmbeddingStore`].
///
/// Read-only once built: search takes `&self` and never mutates, so an
/// `Arc<HnswIndex>` can be queried from any number of threads.
#[derive(Debug)]
pub struct HnswIndex {
    pub(crate) config: HnswConfig,
    pub(crate) store: Arc<EmbeddingStore>,
    /// Cached `1 / ||v||` per node, recomputed from the store on build and load.
    pub(crate) inv_norms: Vec<f32>,
    pub(crate) neighbors: Vec<Vec<Vec<u32>>>, // [node_id][layer][neighbor_ids]
    pub(crate) layers: Vec<u8>,
    pub(crate) entry_point: Option<u32>,
    pub(crate) max_layer: usize,
    pub(crate) node_count: u32,
}

impl HnswIndex {
    fn empty(store: Arc<EmbeddingStore>, config: HnswConfig) -> Self {
        let inv_norms = store.iter().map(inverse_norm).collect();
        let capacity = store.len();
        Self {
            config,
            store,
            inv_norms,
            neighbors: Vec::with_capacity(capacity),
            layers: Vec::with_capacity(capacity),
            entry_point: None,
            max_layer: 0,
            node_count: 0,
        }
    }

    /// Builds the graph by inserting every stored vector in id order.
    ///
    /// Insertion order shapes the graph: the same vectors in a different order
    /// produce a different, comparably accurate, graph.
    pub fn build(store: Arc<EmbeddingStore>, config: HnswConfig) -> Result<Self> {
        config.validate()?;
        let total = u32::try_from(store.len())
            .map_err(|_| Error::InvalidConfig("index is limited to u32::MAX nodes".into()))?;
        let started = Instant::now();
        let mut index = Self::empty(store, config);
        let mut rng = StdRng::seed_from_u64(index.config.seed);
        let mut visited = VisitedSet::with_capacity(total as usize);

        for id in 0..total {
            let level = index.random_level(&mut rng);
            index.insert(id, level, &mut visited);
            if (id + 1) % 10_000 == 0 {
                tracing::debug!("Inserted {}/{} nodes", id + 1, total);
            }
        }

        let stats = index.stats();
        if stats.isolated_nodes > 0 {
            tracing::warn!(
                "{} of {} nodes have no layer-0 neighbors; recall may degrade",
                stats.isolated_nodes,
                stats.node_count
            );
        }
        tracing::info!(
            "Built HNSW index: {} nodes, dim {}, {} layers, M={}, ef_construction={} in {:.2?}",
            index.node_count,
            index.dimension(),
            index.max_layer + 1,
            index.config.m,
            index.config.ef_construction,
            started.elapsed()
        );
        Ok(index)
    }

    /// Reassembles an index from persisted topology. Callers have validated the parts.
    pub(crate) fn from_parts(
        store: Arc<EmbeddingStore>,
        config: HnswConfig,
        layers: Vec<u8>,
        neighbors: Vec<Vec<Vec<u32>>>,
        entry_point: Option<u32>,
        max_layer: usize,
    ) -> Self {
        let mut index = Self::empty(store, config);
        index.node_count = layers.len() as u32;
        index.layers = layers;
        index.neighbors = neighbors;
        index.entry_point = entry_point;
        index.max_layer = max_layer;
        index
    }

    /// Draws a layer from an exponential distribution with scale `1/ln(M)`.
    pub(crate) fn random_level(&self, rng: &mut StdRng) -> usize {
        let ml = 1.0 / (self.config.m as f64).ln();
        // 1 - [0, 1) keeps ln() away from zero
        let r: f64 = 1.0 - rng.gen::<f64>();
        let level = (-r.ln() * ml).floor() as usize;
        level.min(self.config.max_layers - 1)
    }

    /// Neighbor capacity at the given layer.
    #[inline]
    pub(crate) fn max_neighbors(&self, layer: usize) -> usize {
        if layer == 0 {
            self.config.m_max0
        } else {
            self.config.m
        }
    }

    /// Distance from an arbitrary query to a stored node.
    #[inline]
    pub(crate) fn distance_to(&self, query: &[f32], query_inv_norm: f32, id: u32) -> f32 {
        self.config.distance_metric.distance_prenorm(
            query,
            query_inv_norm,
            self.store.vector(id),
            self.inv_norms[id as usize],
        )
    }

    /// Distance between two stored nodes.
    #[inline]
    pub(crate) fn distance_between(&self, a: u32, b: u32) -> f32 {
        self.distance_to(self.store.vector(a), self.inv_norms[a as usize], b)
    }

    pub fn config(&self) -> &HnswConfig {
        &self.config
    }

    /// The embedding store backing this index.
    pub fn store(&self) -> &Arc<EmbeddingStore> {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.node_count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.node_count == 0
    }

    pub fn dimension(&self) -> usize {
        self.store.dimension()
    }

    pub fn entry_point(&self) -> Option<u32> {
        self.entry_point
    }

    /// Highest layer present in the graph (0 for an empty index).
    pub fn max_layer(&self) -> usize {
        self.max_layer
    }

    /// Layer assignment of a node.
    pub fn layer_of(&self, id: u32) -> Result<usize> {
        self.layers
            .get(id as usize)
            .map(|&l| l as usize)
            .ok_or(Error::IdOutOfRange {
                id: id as usize,
                len: self.len(),
            })
    }

    /// Neighbor ids of `id` at `layer`; empty when the node does not reach that layer.
    pub fn neighbors(&self, id: u32, layer: usize) -> Result<&[u32]> {
        let node = self.neighbors.get(id as usize).ok_or(Error::IdOutOfRange {
            id: id as usize,
            len: self.len(),
        })?;
        Ok(node.get(layer).map(Vec::as_slice).unwrap_or(&[]))
    }

    /// Structural summary of the graph.
    pub fn stats(&self) -> IndexStats {
        IndexStats::collect(self)
    }
}
