//! Module: row
//! Responsibility: the `Row` tuple type and the `RowKey` derived from it.
//! Does not own: distinctness policy (which columns feed a key) — that is
//! `distinct`'s job; this module only knows how to project.
//! Boundary: pure data types, no I/O, no buffer lifecycle state.

use crate::value::Value;

///
/// Row
///
/// An ordered sequence of exactly `total_column_count` values. The first
/// `visible_column_count` are returned to the consumer; any trailing columns
/// are sort keys or distinct helpers that are never surfaced.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Row<V: Value> {
    values: Vec<V>,
    visible_column_count: usize,
}

impl<V: Value> Row<V> {
    /// Build a row. Panics if `visible_column_count` exceeds the number of
    /// values — this is a caller-side programming error, not a runtime
    /// condition the engine should recover from.
    #[must_use]
    pub fn new(values: Vec<V>, visible_column_count: usize) -> Self {
        assert!(
            visible_column_count <= values.len(),
            "visible_column_count ({visible_column_count}) exceeds total columns ({})",
            values.len()
        );
        Self {
            values,
            visible_column_count,
        }
    }

    #[must_use]
    pub fn total_column_count(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub const fn visible_column_count(&self) -> usize {
        self.visible_column_count
    }

    #[must_use]
    pub fn all_values(&self) -> &[V] {
        &self.values
    }

    #[must_use]
    pub fn visible_values(&self) -> &[V] {
        &self.values[..self.visible_column_count]
    }

    pub fn all_values_mut(&mut self) -> &mut [V] {
        &mut self.values
    }

    #[must_use]
    pub fn value_at(&self, index: usize) -> Option<&V> {
        self.values.get(index)
    }

    /// Project onto the visible prefix: the default distinct/sort key shape.
    #[must_use]
    pub fn visible_key(&self) -> RowKey<V> {
        RowKey(self.visible_values().to_vec())
    }

    /// Project onto an explicit set of column indexes, in the order given.
    /// Used by `configure-distinct-on`.
    #[must_use]
    pub fn project_key(&self, indexes: &[usize]) -> RowKey<V> {
        RowKey(indexes.iter().map(|&i| self.values[i].clone()).collect())
    }

    pub fn into_values(self) -> Vec<V> {
        self.values
    }
}

///
/// RowKey
///
/// A value sequence derived from a row, used only as a map key: equality and
/// hash are defined element-wise over the projected slice.
///

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RowKey<V: Value>(Vec<V>);

impl<V: Value> RowKey<V> {
    #[must_use]
    pub fn as_slice(&self) -> &[V] {
        &self.0
    }
}
