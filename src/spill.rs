//! Module: spill
//! Responsibility: the abstract on-disk tuple set the buffer promotes into
//! once its row population exceeds the configured memory threshold, plus one
//! reference in-process implementation for tests.
//! Does not own: the promotion *decision* (buffer/`session` policy owns
//! that) or the real disk-backed storage engine — a production embedding
//! would plug in a B-tree or MV-store temp table here instead of
//! `MemTableBackend`.
//! Boundary: `SpillBackend<V>` is the entire surface the buffer calls
//! through; nothing else in this crate knows what's on the other side.

use crate::error::BufferError;
use crate::row::{Row, RowKey};
use crate::value::Value;
use indexmap::IndexMap;

///
/// SpillBackend
///
/// Abstract on-disk tuple set. The backend owns its own distinctness when
/// the buffer delegates to it: `add_row` is passed the row's distinct key
/// (when the buffer is in distinct mode) and must silently discard rows
/// whose key is already present, mirroring `DistinctIndex`'s first-wins
/// rule.
///

pub trait SpillBackend<V: Value> {
    /// Append one row. `key` is `Some` when the buffer is operating in
    /// distinct mode; the backend must dedup on it. Returns the backend's
    /// row count after the call.
    fn add_row(&mut self, key: Option<&RowKey<V>>, row: Row<V>) -> Result<u64, BufferError>;

    /// Append many rows in order; equivalent to repeated `add_row` but lets
    /// backends batch I/O.
    fn add_rows(&mut self, rows: Vec<(Option<RowKey<V>>, Row<V>)>) -> Result<u64, BufferError> {
        let mut count = self.row_count();
        for (key, row) in rows {
            count = self.add_row(key.as_ref(), row)?;
        }
        Ok(count)
    }

    /// Remove one row matching `key`. Returns the backend's row count after
    /// the call.
    fn remove_row(&mut self, key: &RowKey<V>) -> Result<u64, BufferError>;

    fn contains(&self, key: &RowKey<V>) -> Result<bool, BufferError>;

    /// Rewind the backend's streaming cursor to the beginning.
    fn reset(&mut self) -> Result<(), BufferError>;

    /// Advance the streaming cursor and return the next row, or `None` at
    /// end of stream.
    fn next(&mut self) -> Result<Option<Row<V>>, BufferError>;

    fn row_count(&self) -> u64;

    /// Release backend resources. Idempotent.
    fn close(&mut self);

    /// Produce an independent read-only handle over the same data, or
    /// `None` when the backend cannot safely support that (e.g. it holds
    /// exclusive write locks on a temp table).
    fn clone_read_only(&self) -> Option<Box<dyn SpillBackend<V>>>;
}

///
/// MemTableBackend
///
/// Reference `SpillBackend` implementation backed by an in-process vector.
/// Stands in for the production temp-table / MV-temp backend described in
/// the system overview; sufficient to exercise every `ResultBuffer` code
/// path but not a durable on-disk store.
///

pub struct MemTableBackend<V: Value> {
    entries: Vec<(Option<RowKey<V>>, Row<V>)>,
    distinct_lookup: IndexMap<RowKey<V>, ()>,
    cursor: usize,
}

impl<V: Value> Default for MemTableBackend<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            distinct_lookup: IndexMap::new(),
            cursor: 0,
        }
    }
}

impl<V: Value> MemTableBackend<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<V: Value + 'static> SpillBackend<V> for MemTableBackend<V> {
    fn add_row(&mut self, key: Option<&RowKey<V>>, row: Row<V>) -> Result<u64, BufferError> {
        if let Some(key) = key {
            if self.distinct_lookup.contains_key(key) {
                return Ok(self.row_count());
            }
            self.distinct_lookup.insert(key.clone(), ());
            self.entries.push((Some(key.clone()), row));
        } else {
            self.entries.push((None, row));
        }

        Ok(self.row_count())
    }

    fn remove_row(&mut self, key: &RowKey<V>) -> Result<u64, BufferError> {
        if self.distinct_lookup.shift_remove(key).is_none() {
            return Ok(self.row_count());
        }
        if let Some(pos) = self
            .entries
            .iter()
            .position(|(entry_key, _)| entry_key.as_ref() == Some(key))
        {
            self.entries.remove(pos);
        }

        Ok(self.row_count())
    }

    fn contains(&self, key: &RowKey<V>) -> Result<bool, BufferError> {
        Ok(self.distinct_lookup.contains_key(key))
    }

    fn reset(&mut self) -> Result<(), BufferError> {
        self.cursor = 0;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row<V>>, BufferError> {
        let Some((_, row)) = self.entries.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;
        Ok(Some(row.clone()))
    }

    fn row_count(&self) -> u64 {
        self.entries.len() as u64
    }

    fn close(&mut self) {
        self.entries.clear();
        self.distinct_lookup.clear();
        self.cursor = 0;
    }

    fn clone_read_only(&self) -> Option<Box<dyn SpillBackend<V>>> {
        Some(Box::new(Self {
            entries: self.entries.clone(),
            distinct_lookup: self.distinct_lookup.clone(),
            cursor: 0,
        }))
    }
}
