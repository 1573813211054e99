//! HNSW insertion algorithm.
//!
//! Inserts a stored vector into the graph with bidirectional connections and
//! heuristic neighbor pruning (Algorithm 4 from the HNSW paper). Only used by
//! [`HnswIndex::build`]; the finished index exposes no mutation.

use crate::hnsw::graph::HnswIndex;
use crate::hnsw::search::{greedy_closest, search_layer};
use crate::hnsw::visited::VisitedSet;
use std::sync::Arc;

impl HnswIndex {
    /// Links node `id` (its vector already in the store) into the graph at `level`.
    /// `id` must equal `node_count` before this call.
    pub(crate) fn insert(&mut self, id: u32, level: usize, visited: &mut VisitedSet) {
        debug_assert_eq!(id, self.node_count);
        let mut node_neighbors: Vec<Vec<u32>> = vec![Vec::new(); level + 1];

        // First node becomes the entry point
        let Some(entry_point) = self.entry_point else {
            self.neighbors.push(node_neighbors);
            self.layers.push(level as u8);
            self.node_count += 1;
            self.entry_point = Some(id);
            self.max_layer = level;
            return;
        };

        let store = Arc::clone(&self.store);
        let query = store.vector(id);
        let query_inv_norm = self.inv_norms[id as usize];

        // Phase 1: greedy descent from the top layer down to level + 1
        let mut current = (self.distance_to(query, query_inv_norm, entry_point), entry_point);
        for layer in (level + 1..=self.max_layer).rev() {
            current = greedy_closest(self, query, query_inv_norm, current, layer);
        }

        // Phase 2: beam search each layer the node joins and pick its neighbors
        let top = level.min(self.max_layer);
        let mut layer_eps: Vec<u32> = vec![current.1];
        for layer in (0..=top).rev() {
            let candidates = search_layer(
                self,
                query,
                query_inv_norm,
                &layer_eps,
                self.config.ef_construction,
                layer,
                visited,
            );
            node_neighbors[layer] =
                select_neighbors_heuristic(self, &candidates, self.max_neighbors(layer));

            layer_eps.clear();
            layer_eps.extend(candidates.iter().map(|&(_, cid)| cid));
            if layer_eps.is_empty() {
                layer_eps.push(current.1);
            }
        }

        self.neighbors.push(node_neighbors);
        self.layers.push(level as u8);
        self.node_count += 1;

        // Phase 3: back-links, re-pruning any neighbor pushed over capacity
        for layer in 0..=top {
            let m_max = self.max_neighbors(layer);
            let linked = self.neighbors[id as usize][layer].clone();
            for neighbor_id in linked {
                let nid = neighbor_id as usize;
                self.neighbors[nid][layer].push(id);
                if self.neighbors[nid][layer].len() > m_max {
                    let candidates: Vec<(f32, u32)> = self.neighbors[nid][layer]
                        .iter()
                        .map(|&cid| (self.distance_between(neighbor_id, cid), cid))
                        .collect();
                    self.neighbors[nid][layer] =
                        select_neighbors_heuristic(self, &candidates, m_max);
                }
            }
        }

        // Strictly higher: on ties the earlier promoted node stays entry point
        if level > self.max_layer {
            self.max_layer = level;
            self.entry_point = Some(id);
        }
    }
}

/// Heuristic neighbor selection (Algorithm 4 from the HNSW paper).
///
/// Walks candidates by ascending `(distance, id)` and admits one only if it is
/// no farther from the base node than from every neighbor already admitted.
/// `candidates` carry their distance to the base node.
pub(crate) fn select_neighbors_heuristic(
    index: &HnswIndex,
    candidates: &[(f32, u32)],
    m: usize,
) -> Vec<u32> {
    let mut sorted = candidates.to_vec();
    sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut selected: Vec<u32> = Vec::with_capacity(m);
    for &(dist_to_base, cid) in &sorted {
        if selected.len() >= m {
            break;
        }
        let is_diverse = selected
            .iter()
            .all(|&sid| dist_to_base <= index.distance_between(cid, sid));
        if is_diverse {
            selected.push(cid);
        }
    }

    if index.config.keep_pruned_connections && selected.len() < m {
        for &(_, cid) in &sorted {
            if selected.len() >= m {
                break;
            }
            if !selected.contains(&cid) {
                selected.push(cid);
            }
        }
    }

    selected
}
