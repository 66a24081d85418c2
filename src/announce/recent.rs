//! Bounded memory of what was recently announced.

use std::collections::{HashSet, VecDeque};

/// Remembers recently announced features so the watch loop does not
/// repeat itself.
///
/// Keys are a feature's OSM ids joined in order, so a merged
/// intersection and one of its constituent roads never collide. The
/// window holds at most `max_size` entries; adding past that evicts the
/// oldest.
#[derive(Debug)]
pub struct RecentCallouts {
    keys: HashSet<String>,
    order: VecDeque<String>,
    max_size: usize,
}

impl RecentCallouts {
    pub fn new(max_size: usize) -> Self {
        Self {
            keys: HashSet::new(),
            order: VecDeque::new(),
            max_size,
        }
    }

    fn key(osm_ids: &[i64]) -> String {
        osm_ids
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Whether a feature with exactly these ids was announced recently.
    pub fn contains(&self, osm_ids: &[i64]) -> bool {
        self.keys.contains(&Self::key(osm_ids))
    }

    /// Marks a feature as announced. Re-adding an existing entry does
    /// not refresh its place in the eviction order.
    pub fn add(&mut self, osm_ids: &[i64]) {
        let key = Self::key(osm_ids);
        if !self.keys.insert(key.clone()) {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.max_size {
            if let Some(oldest) = self.order.pop_front() {
                self.keys.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
