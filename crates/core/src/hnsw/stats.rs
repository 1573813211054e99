//! Structural statistics of a built graph.
//!
//! Construction never fails on a poorly connected node, so these numbers are
//! how degraded graphs get noticed.

use crate::hnsw::graph::HnswIndex;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    pub node_count: usize,
    pub dimension: usize,
    pub max_layer: usize,
    pub entry_point: Option<u32>,
    /// Number of nodes present on each layer, from layer 0 upwards.
    pub nodes_per_layer: Vec<usize>,
    pub mean_degree_layer0: f64,
    pub max_degree_layer0: usize,
    /// Nodes with an empty layer-0 neighbor list (ignored for single-node graphs).
    pub isolated_nodes: usize,
    /// Nodes not reachable from the entry point over layer-0 edges.
    pub unreachable_nodes: usize,
}

impl IndexStats {
    pub(crate) fn collect(index: &HnswIndex) -> Self {
        let n = index.node_count as usize;
        let mut nodes_per_layer = vec![0usize; if n == 0 { 0 } else { index.max_layer + 1 }];
        for &l in &index.layers {
            for count in nodes_per_layer.iter_mut().take(l as usize + 1) {
                *count += 1;
            }
        }

        let degrees: Vec<usize> = index
            .neighbors
            .iter()
            .map(|node| node.first().map_or(0, Vec::len))
            .collect();
        let total_degree: usize = degrees.iter().sum();
        let isolated_nodes = if n > 1 {
            degrees.iter().filter(|&&d| d == 0).count()
        } else {
            0
        };

        Self {
            node_count: n,
            dimension: index.dimension(),
            max_layer: index.max_layer,
            entry_point: index.entry_point,
            nodes_per_layer,
            mean_degree_layer0: if n == 0 {
                0.0
            } else {
                total_degree as f64 / n as f64
            },
            max_degree_layer0: degrees.iter().copied().max().unwrap_or(0),
            isolated_nodes,
            unreachable_nodes: n - reachable_from_entry(index),
        }
    }
}

/// Depth-first walk over layer-0 edges from the entry point.
fn reachable_from_entry(index: &HnswIndex) -> usize {
    let Some(ep) = index.entry_point else {
        return 0;
    };
    let mut seen = vec![false; index.node_count as usize];
    let mut stack = vec![ep];
    let mut reached = 0;
    while let Some(id) = stack.pop() {
        if std::mem::replace(&mut seen[id as usize], true) {
            continue;
        }
        reached += 1;
        if let Some(list) = index.neighbors[id as usize].first() {
            stack.extend(list.iter().copied().filter(|&nid| !seen[nid as usize]));
        }
    }
    reached
}

impl fmt::Display for IndexStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "nodes:              {}", self.node_count)?;
        writeln!(f, "dimension:          {}", self.dimension)?;
        match self.entry_point {
            Some(ep) => writeln!(f, "entry point:        {} (layer {})", ep, self.max_layer)?,
            None => writeln!(f, "entry point:        none")?,
        }
        for (layer, count) in self.nodes_per_layer.iter().enumerate() {
            writeln!(f, "layer {layer:>2}:           {count} nodes")?;
        }
        writeln!(
            f,
            "layer-0 degree:     mean {:.2}, max {}",
            self.mean_degree_layer0, self.max_degree_layer0
        )?;
        writeln!(f, "isolated nodes:     {}", self.isolated_nodes)?;
        write!(f, "unreachable nodes:  {}", self.unreachable_nodes)
    }
}

#[cfg(test)]
mod tests {
    use crate::hnsw::graph::{HnswConfig, HnswIndex};
    use crate::storage::EmbeddingStore;
    use std::sync::Arc;

    #[test]
    fn test_stats_empty() {
        let store = Arc::new(EmbeddingStore::new(4).unwrap());
        let stats = HnswIndex::build(store, HnswConfig::default()).unwrap().stats();
        assert_eq!(stats.node_count, 0);
        assert!(stats.nodes_per_layer.is_empty());
        assert_eq!(stats.unreachable_nodes, 0);
        assert_eq!(stats.mean_degree_layer0, 0.0);
    }

    #[test]
    fn test_stats_layer_counts_shrink_upwards() {
        let vectors: Vec<[f32; 3]> = (0..200)
            .map(|i| {
                let t = i as f32 * 0.37;
                [t.sin(), t.cos(), (t * 0.5).sin()]
            })
            .collect();
        let store = Arc::new(EmbeddingStore::from_vectors(3, &vectors).unwrap());
        let stats = HnswIndex::build(store, HnswConfig::with_m(4)).unwrap().stats();

        assert_eq!(stats.nodes_per_layer[0], 200);
        assert!(stats
            .nodes_per_layer
            .windows(2)
            .all(|w| w[0] >= w[1]));
        assert!(*stats.nodes_per_layer.last().unwrap() >= 1);
        assert!(stats.max_degree_layer0 <= 8);
        assert!(stats.mean_degree_layer0 > 0.0);
        assert_eq!(stats.isolated_nodes, 0);
    }

    #[test]
    fn test_stats_display() {
        let store = Arc::new(EmbeddingStore::from_vectors(2, [[1.0f32, 0.0]]).unwrap());
        let text = HnswIndex::build(store, HnswConfig::default())
            .unwrap()
            .stats()
            .to_string();
        assert!(text.contains("nodes:              1"));
        assert!(text.contains("unreachable nodes:  0"));
    }
}
