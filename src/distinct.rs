//! Module: distinct
//! Responsibility: insertion-ordered mapping from row-key to canonical row,
//! the in-memory half of duplicate elimination before spill promotion.
//! Does not own: spill promotion policy or the decision of which columns
//! feed the key — `buffer` decides both and only calls `insert`/`remove`/
//! `contains` here.
//! Boundary: a thin, order-preserving map; no I/O.

use crate::row::{Row, RowKey};
use crate::value::Value;
use indexmap::IndexMap;

///
/// DistinctIndex
///
/// First insertion wins: a later duplicate key is discarded silently.
/// Iteration order is insertion order, which is observable whenever no sort
/// is configured (§4.2 tie-break rules).
///

#[derive(Debug, Default)]
pub struct DistinctIndex<V: Value> {
    rows: IndexMap<RowKey<V>, Row<V>>,
}

impl<V: Value> DistinctIndex<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Insert `row` under `key` if absent. Returns `true` if this was a new
    /// key (the row was kept), `false` if a row already occupied this key
    /// (the new row was discarded, first-insertion-wins).
    pub fn insert_if_absent(&mut self, key: RowKey<V>, row: Row<V>) -> bool {
        if self.rows.contains_key(&key) {
            return false;
        }
        self.rows.insert(key, row);
        true
    }

    #[must_use]
    pub fn contains(&self, key: &RowKey<V>) -> bool {
        self.rows.contains_key(key)
    }

    /// Remove one row by key. Returns `true` if a row was present.
    pub fn remove(&mut self, key: &RowKey<V>) -> bool {
        self.rows.shift_remove(key).is_some()
    }

    /// Drain all rows in insertion order, leaving the index empty. Used
    /// during spill promotion, where the caller transfers every row into
    /// the backend and then discards the map.
    pub fn drain_in_order(&mut self) -> Vec<Row<V>> {
        self.rows.drain(..).map(|(_, row)| row).collect()
    }

    /// Consume the index and return its rows in insertion order. Used by
    /// `done()` when no spill occurred.
    #[must_use]
    pub fn into_rows_in_order(self) -> Vec<Row<V>> {
        self.rows.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::DistinctIndex;
    use crate::row::Row;
    use crate::value::ScalarValue;

    fn row(v: i64) -> Row<ScalarValue> {
        Row::new(vec![ScalarValue::Int(v)], 1)
    }

    #[test]
    fn first_insertion_wins_on_duplicate_key() {
        let mut idx = DistinctIndex::new();
        let r1 = row(1);
        let key = r1.visible_key();
        assert!(idx.insert_if_absent(key.clone(), r1));

        let r1_dup = row(1);
        assert!(!idx.insert_if_absent(key, r1_dup));
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn iteration_preserves_first_insertion_order() {
        let mut idx = DistinctIndex::new();
        for v in [1, 2, 1, 3, 2] {
            let r = row(v);
            let key = r.visible_key();
            idx.insert_if_absent(key, r);
        }

        let rows = idx.into_rows_in_order();
        let values: Vec<i64> = rows
            .iter()
            .map(|r| match r.value_at(0) {
                Some(ScalarValue::Int(i)) => *i,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn remove_drops_matching_key_only() {
        let mut idx = DistinctIndex::new();
        let r1 = row(1);
        let r2 = row(2);
        idx.insert_if_absent(r1.visible_key(), r1.clone());
        idx.insert_if_absent(r2.visible_key(), r2);

        assert!(idx.remove(&r1.visible_key()));
        assert_eq!(idx.len(), 1);
        assert!(!idx.contains(&r1.visible_key()));
    }

    #[test]
    fn drain_in_order_empties_the_index() {
        let mut idx = DistinctIndex::new();
        for v in [1, 2, 3] {
            let r = row(v);
            idx.insert_if_absent(r.visible_key(), r);
        }

        let drained = idx.drain_in_order();
        assert_eq!(drained.len(), 3);
        assert!(idx.is_empty());
    }
}
