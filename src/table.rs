use hashbrown::HashMap;

use crate::stats::StationStats;

/// Capacity hint used when none is configured; the reference data has
/// a few dozen stations.
pub const DEFAULT_CAPACITY: usize = 64;

/// Key → running statistics. Keys are raw bytes and compared byte-wise.
#[derive(Debug, Clone, Default)]
pub struct AggregationTable {
    entries: HashMap<Box<[u8]>, StationStats, ahash::RandomState>,
}

impl AggregationTable {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity_and_hasher(capacity, ahash::RandomState::new()),
        }
    }

    /// Folds one observation into the table. The key is copied only the
    /// first time it is seen.
    #[inline]
    pub fn update(&mut self, key: &[u8], value: f64) {
        if let Some(stats) = self.entries.get_mut(key) {
            stats.update(value);
        } else {
            self.entries.insert(key.into(), StationStats::new(value));
        }
    }

    /// Merges a partial table produced by another worker.
    pub fn merge(&mut self, other: AggregationTable) {
        for (key, stats) in other.entries {
            self.entries
                .entry(key)
                .and_modify(|e| e.merge(&stats))
                .or_insert(stats);
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<&StationStats> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &StationStats)> {
        self.entries.iter().map(|(key, stats)| (&**key, stats))
    }

    /// Number of observations folded in across all keys.
    pub fn total_count(&self) -> u64 {
        self.entries.values().map(|stats| stats.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_observation_creates_entry() {
        let mut table = AggregationTable::new();
        assert!(table.is_empty());
        table.update(b"Berlin", 10.0);
        let stats = table.get(b"Berlin").unwrap();
        assert_eq!(*stats, StationStats::new(10.0));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn repeated_keys_fold_in_place() {
        let mut table = AggregationTable::with_capacity(4);
        table.update(b"Berlin", 10.0);
        table.update(b"Berlin", 20.0);
        table.update(b"Hamburg", 5.5);

        assert_eq!(table.len(), 2);
        let berlin = table.get(b"Berlin").unwrap();
        assert_eq!(berlin.count, 2);
        assert_eq!(berlin.mean(), 15.0);
        assert_eq!(table.total_count(), 3);
    }

    #[test]
    fn capacity_hint_smaller_than_key_count_still_works() {
        let mut table = AggregationTable::with_capacity(0);
        for i in 0..1000u32 {
            table.update(format!("station-{i}").as_bytes(), i as f64);
        }
        assert_eq!(table.len(), 1000);
        assert_eq!(table.total_count(), 1000);
    }

    #[test]
    fn merge_combines_overlapping_keys() {
        let mut left = AggregationTable::new();
        left.update(b"Bonn", 1.0);
        left.update(b"Essen", 3.0);
        let mut right = AggregationTable::new();
        right.update(b"Bonn", -2.0);
        right.update(b"Bremen", 8.0);

        left.merge(right);

        assert_eq!(left.len(), 3);
        let bonn = left.get(b"Bonn").unwrap();
        assert_eq!(bonn.min, -2.0);
        assert_eq!(bonn.max, 1.0);
        assert_eq!(bonn.count, 2);
        assert_eq!(left.get(b"Bremen").unwrap().count, 1);
        assert_eq!(left.total_count(), 4);
    }

    #[test]
    fn merge_into_empty_table_is_identity() {
        let mut partial = AggregationTable::new();
        partial.update(b"Leipzig", 4.2);
        let mut acc = AggregationTable::new();
        acc.merge(partial.clone());
        assert_eq!(acc.get(b"Leipzig"), partial.get(b"Leipzig"));
    }
}
