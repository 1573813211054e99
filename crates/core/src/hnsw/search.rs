//! HNSW search algorithms: greedy descent, single-layer beam search and multi-layer KNN.
//!
//! Every ordering is on `(distance, id)`, so equal distances resolve to the
//! lower id and results are deterministic for a given graph.

use crate::error::{Error, Result};
use crate::hnsw::distance::inverse_norm;
use crate::hnsw::graph::HnswIndex;
use crate::hnsw::visited::VisitedSet;
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

thread_local! {
    /// Per-thread visited marks, reused across queries so concurrent searches
    /// share no mutable state.
    static SEARCH_VISITED: RefCell<VisitedSet> = RefCell::new(VisitedSet::default());
}

/// One search hit: a stored vector id and its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub id: u32,
    pub distance: f32,
}

/// Heap entry ordered by distance, then id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Scored {
    distance: OrderedFloat<f32>,
    id: u32,
}

impl Scored {
    fn new(distance: f32, id: u32) -> Self {
        Self {
            distance: OrderedFloat(distance),
            id,
        }
    }
}

/// Greedy single-best walk on one layer: move to any neighbor strictly closer
/// than the current node until none improves. Returns `(distance, id)`.
pub(crate) fn greedy_closest(
    index: &HnswIndex,
    query: &[f32],
    query_inv_norm: f32,
    start: (f32, u32),
    layer: usize,
) -> (f32, u32) {
    let (mut best_dist, mut best) = start;
    loop {
        let mut improved = false;
        let Some(list) = index.neighbors[best as usize].get(layer) else {
            return (best_dist, best);
        };
        for &nid in list {
            let d = index.distance_to(query, query_inv_norm, nid);
            if d < best_dist {
                best_dist = d;
                best = nid;
                improved = true;
            }
        }
        if !improved {
            return (best_dist, best);
        }
    }
}

/// Beam search on a single layer.
///
/// Keeps the `ef` best nodes seen in a max-heap and expands a min-heap frontier
/// until it is empty or its closest entry is farther than the worst kept result.
/// Returns up to `ef` `(distance, id)` pairs in ascending order.
pub(crate) fn search_layer(
    index: &HnswIndex,
    query: &[f32],
    query_inv_norm: f32,
    entry_points: &[u32],
    ef: usize,
    layer: usize,
    visited: &mut VisitedSet,
) -> Vec<(f32, u32)> {
    visited.reset(index.node_count as usize);
    let mut frontier: BinaryHeap<Reverse<Scored>> = BinaryHeap::with_capacity(ef * 2);
    let mut results: BinaryHeap<Scored> = BinaryHeap::with_capacity(ef + 1);

    for &ep in entry_points {
        if visited.insert(ep) {
            let s = Scored::new(index.distance_to(query, query_inv_norm, ep), ep);
            frontier.push(Reverse(s));
            results.push(s);
            if results.len() > ef {
                results.pop();
            }
        }
    }

    while let Some(Reverse(current)) = frontier.pop() {
        if results.len() >= ef {
            if let Some(worst) = results.peek() {
                if current.distance > worst.distance {
                    break;
                }
            }
        }

        let Some(list) = index.neighbors[current.id as usize].get(layer) else {
            continue;
        };
        for &nid in list {
            if !visited.insert(nid) {
                continue;
            }
            let s = Scored::new(index.distance_to(query, query_inv_norm, nid), nid);
            let admit = results.len() < ef || results.peek().is_some_and(|worst| s < *worst);
            if admit {
                frontier.push(Reverse(s));
                results.push(s);
                if results.len() > ef {
                    results.pop(); // drop worst
                }
            }
        }
    }

    results
        .into_sorted_vec()
        .into_iter()
        .map(|s| (s.distance.0, s.id))
        .collect()
}

/// Multi-layer KNN search.
///
/// Greedy descent through layers `max_layer..1`, then a beam of width
/// `max(ef, k)` at layer 0. Returns at most `k` hits, ascending by distance.
pub fn knn_search(index: &HnswIndex, query: &[f32], k: usize, ef: usize) -> Result<Vec<Neighbor>> {
    if query.len() != index.dimension() {
        return Err(Error::DimensionMismatch {
            expected: index.dimension(),
            actual: query.len(),
        });
    }
    let Some(entry_point) = index.entry_point else {
        return Err(Error::EmptyIndex);
    };
    if k == 0 {
        return Ok(Vec::new());
    }

    let query_inv_norm = inverse_norm(query);
    let mut current = (
        index.distance_to(query, query_inv_norm, entry_point),
        entry_point,
    );
    for layer in (1..=index.max_layer).rev() {
        current = greedy_closest(index, query, query_inv_norm, current, layer);
    }

    let ef = ef.max(k);
    let mut hits = SEARCH_VISITED.with(|cell| {
        let mut visited = cell.borrow_mut();
        search_layer(
            index,
            query,
            query_inv_norm,
            std::slice::from_ref(&current.1),
            ef,
            0,
            &mut visited,
        )
    });
    hits.truncate(k);

    Ok(hits
        .into_iter()
        .map(|(distance, id)| Neighbor { id, distance })
        .collect())
}

impl HnswIndex {
    /// Approximate `k` nearest neighbors with candidate list size `ef` (raised to `k`).
    pub fn search(&self, query: &[f32], k: usize, ef: usize) -> Result<Vec<Neighbor>> {
        knn_search(self, query, k, ef)
    }

    /// [`search`](Self::search) with the configured `ef_search`.
    pub fn search_default(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        knn_search(self, query, k, self.config.ef_search)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hnsw::graph::HnswConfig;
    use crate::storage::EmbeddingStore;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::Arc;

    fn random_store(n: usize, dim: usize, seed: u64) -> Arc<EmbeddingStore> {
        let mut rng = StdRng::seed_from_u64(seed);
        let vectors: Vec<Vec<f32>> = (0..n)
            .map(|_| (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect())
            .collect();
        Arc::new(EmbeddingStore::from_vectors(dim, &vectors).unwrap())
    }

    fn compass() -> HnswIndex {
        let store = EmbeddingStore::from_vectors(
            2,
            [[1.0f32, 0.0], [0.0, 1.0], [-1.0, 0.0], [0.0, -1.0]],
        )
        .unwrap();
        HnswIndex::build(Arc::new(store), HnswConfig::with_m(2)).unwrap()
    }

    #[test]
    fn test_greedy_step_needs_strict_improvement() {
        let index = compass();
        let query = [1.0f32, 1.0];
        let q_inv = inverse_norm(&query);
        // East (0) and north (1) are equally close; starting at north must stay put
        let start = (index.distance_to(&query, q_inv, 1), 1);
        assert!(index.neighbors(1, 0).unwrap().contains(&0));
        assert_eq!(index.distance_to(&query, q_inv, 0), start.0);
        assert_eq!(greedy_closest(&index, &query, q_inv, start, 0), start);

        let from_west = (index.distance_to(&query, q_inv, 2), 2);
        let (_, reached) = greedy_closest(&index, &query, q_inv, from_west, 0);
        assert_eq!(reached, 1);
    }

    #[test]
    fn test_compass_scenario() {
        let index = compass();
        let hits = index.search(&[0.9, 0.1], 1, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 0);
        let expected = 1.0 - 0.9 / (0.82f32).sqrt();
        assert!((hits[0].distance - expected).abs() < 1e-4);
        assert!((hits[0].distance - 0.006).abs() < 1e-3);
    }

    #[test]
    fn test_ties_resolve_to_lower_id() {
        let index = compass();
        // Equidistant from (1,0) and (0,1)
        let hits = index.search(&[1.0, 1.0], 2, 10).unwrap();
        assert_eq!(hits[0].id, 0);
        assert_eq!(hits[1].id, 1);
        assert_eq!(hits[0].distance, hits[1].distance);
    }

    #[test]
    fn test_results_sorted_and_bounded() {
        let index = HnswIndex::build(random_store(300, 12, 3), HnswConfig::default()).unwrap();
        let query = index.store().get(17).unwrap().to_vec();
        for k in [1, 5, 40] {
            let hits = index.search(&query, k, 64).unwrap();
            assert_eq!(hits.len(), k);
            assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
        }
        assert_eq!(index.stats().unreachable_nodes, 0);
        let all = index.search(&query, 1_000, 64).unwrap();
        assert_eq!(all.len(), 300, "beam widens to k so every node is returned");
    }

    #[test]
    fn test_k_zero() {
        assert!(compass().search(&[1.0, 0.0], 0, 10).unwrap().is_empty());
    }

    #[test]
    fn test_empty_index() {
        let store = Arc::new(EmbeddingStore::new(2).unwrap());
        let index = HnswIndex::build(store, HnswConfig::default()).unwrap();
        assert!(matches!(
            index.search(&[1.0, 0.0], 3, 10),
            Err(Error::EmptyIndex)
        ));
    }

    #[test]
    fn test_query_dimension_mismatch() {
        assert!(matches!(
            compass().search(&[1.0, 0.0, 0.0], 1, 10),
            Err(Error::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_single_node() {
        let store = Arc::new(EmbeddingStore::from_vectors(3, [[0.2f32, 0.4, 0.1]]).unwrap());
        let index = HnswIndex::build(store, HnswConfig::default()).unwrap();
        let hits = index.search(&[1.0, 1.0, 1.0], 5, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 0);
    }

    #[test]
    fn test_self_similarity() {
        let index = HnswIndex::build(random_store(500, 16, 11), HnswConfig::default()).unwrap();
        for id in 0..500u32 {
            let query = index.store().get(id as usize).unwrap().to_vec();
            let hits = index.search(&query, 1, 64).unwrap();
            assert_eq!(hits[0].id, id);
            assert!(hits[0].distance.abs() < 1e-5);
        }
    }

    #[test]
    fn test_concurrent_queries_match_sequential() {
        let index = Arc::new(
            HnswIndex::build(random_store(400, 8, 5), HnswConfig::with_m(6)).unwrap(),
        );
        let expected: Vec<Vec<Neighbor>> = (0..8)
            .map(|i| {
                let q = index.store().get(i * 13).unwrap().to_vec();
                index.search(&q, 10, 50).unwrap()
            })
            .collect();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let index = Arc::clone(&index);
                std::thread::spawn(move || {
                    let q = index.store().get(i * 13).unwrap().to_vec();
                    index.search(&q, 10, 50).unwrap()
                })
            })
            .collect();
        for (handle, want) in handles.into_iter().zip(expected) {
            assert_eq!(handle.join().unwrap(), want);
        }
    }
}
