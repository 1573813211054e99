//! Epoch-stamped visited marks for graph traversal.
//!
//! Each node id maps to the epoch in which it was last visited. Starting a new
//! traversal bumps the epoch instead of clearing the array.

#[derive(Debug, Default)]
pub struct VisitedSet {
    marks: Vec<u32>,
    epoch: u32,
}

impl VisitedSet {
    pub fn with_capacity(len: usize) -> Self {
        let mut set = Self::default();
        set.reset(len);
        set
    }

    /// Starts a fresh traversal over ids `0..len`, growing the mark array if needed.
    /// Marks are only zeroed when the epoch counter wraps.
    pub fn reset(&mut self, len: usize) {
        if len > self.marks.len() {
            self.marks.resize(len, 0);
        }
        self.epoch = match self.epoch.checked_add(1) {
            Some(e) => e,
            None => {
                self.marks.fill(0);
                1
            }
        };
    }

    /// Marks `id`; returns `true` if it had not been visited in this traversal.
    #[inline]
    pub fn insert(&mut self, id: u32) -> bool {
        let slot = &mut self.marks[id as usize];
        if *slot == self.epoch {
            false
        } else {
            *slot = self.epoch;
            true
        }
    }
}
