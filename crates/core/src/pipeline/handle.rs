use crate::hnsw::HnswIndex;
use parking_lot::RwLock;
use std::sync::Arc;

/// Cloneable handle to the live index.
///
/// Readers take the lock only long enough to clone the inner `Arc`; searches
/// then run against that snapshot without holding any lock. [`swap`](Self::swap)
/// publishes a new graph atomically, and in-flight queries finish on the old one.
#[derive(Debug, Clone)]
pub struct IndexHandle {
    inner: Arc<RwLock<Arc<HnswIndex>>>,
}

impl IndexHandle {
    pub fn new(index: HnswIndex) -> Self {
        Self::from_arc(Arc::new(index))
    }

    pub fn from_arc(index: Arc<HnswIndex>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(index)),
        }
    }

    pub fn current(&self) -> Arc<HnswIndex> {
        Arc::clone(&self.inner.read())
    }

    /// Replaces the live index and returns the previous one.
    pub fn swap(&self, index: HnswIndex) -> Arc<HnswIndex> {
        let nodes = index.len();
        let prev = std::mem::replace(&mut *self.inner.write(), Arc::new(index));
        tracing::info!("Swapped index: {} -> {} nodes", prev.len(), nodes);
        prev
    }
}

impl From<HnswIndex> for IndexHandle {
    fn from(index: HnswIndex) -> Self {
        Self::new(index)
    }
}
