//! Module: buffer
//! Responsibility: `ResultBuffer`, the materialized query-result buffer:
//! owns the insertion protocol (LOB materialization, distinct filtering,
//! spill promotion), finalization (flush, sort, window), and the forward
//! cursor a client scans afterward.
//! Does not own: the concrete value domain (`value`), the on-disk backend
//! (`spill`), or the collaborating session (`session`) — this module wires
//! them together per the public contract.
//! Boundary: the only module allowed to hold both a `Session` and a
//! `SpillBackend` at once.

use crate::distinct::DistinctIndex;
use crate::error::{BufferError, ErrorOrigin};
use crate::hash::{StableHash, stable_hash_parts};
use crate::obs::{BufferEvent, MetricsSink, NullSink};
use crate::row::{Row, RowKey};
use crate::session::{Session, default_max_memory_rows};
use crate::sort::{SortOrder, full_sort, partial_sort_window};
use crate::spill::{MemTableBackend, SpillBackend};
use crate::value::{ColumnMeta, LobMaterialization, Value};
use crate::window::{WindowSpec, extend_for_ties};
use std::rc::Rc;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Lifecycle {
    Building,
    Finalized,
    Closed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum CursorPosition {
    BeforeFirst,
    At(usize),
    AfterLast,
}

enum MemoryRows<V: Value> {
    Distinct(DistinctIndex<V>),
    Plain(Vec<Row<V>>),
}

enum Storage<V: Value + 'static> {
    Memory(MemoryRows<V>),
    Spilled(Box<dyn SpillBackend<V>>),
}

fn default_spill_factory<V: Value + 'static>() -> Box<dyn Fn() -> Box<dyn SpillBackend<V>>> {
    Box::new(|| Box::new(MemTableBackend::new()) as Box<dyn SpillBackend<V>>)
}

fn hash_key<V: Value>(key: &RowKey<V>) -> StableHash {
    let parts: Vec<Vec<u8>> = key
        .as_slice()
        .iter()
        .map(|v| format!("{v:?}").into_bytes())
        .collect();
    stable_hash_parts(parts.iter().map(Vec::as_slice))
}

fn materialize_row<V: Value, S: Session<V>>(row: &mut Row<V>, session: &mut S) -> bool {
    let mut found_lob = false;
    for slot in row.all_values_mut() {
        if let LobMaterialization::Owned(owned) = slot.materialize() {
            session.add_temporary_lob(owned.clone());
            *slot = owned;
            found_lob = true;
        }
    }
    found_lob
}

///
/// ResultBuffer
///
/// Lifecycle: `Building` (accepts `add_row`/`remove_distinct_row`, rejects
/// cursor operations) -> `done()` -> `Finalized` (a fixed, ordered,
/// windowed row sequence with a rewindable forward cursor) -> `close()` ->
/// `Closed` (terminal, idempotent). Every public method checks this state
/// and returns `BufferError::invalid_state` on a lifecycle violation.
///

pub struct ResultBuffer<V: Value + 'static, S: Session<V>> {
    columns: Vec<ColumnMeta>,
    visible_column_count: usize,
    distinct: bool,
    distinct_on: Option<Vec<usize>>,
    sort: Option<SortOrder>,
    window: WindowSpec,
    max_memory_rows: Option<usize>,
    spill_backend_factory: Box<dyn Fn() -> Box<dyn SpillBackend<V>>>,
    session: S,
    metrics: Box<dyn MetricsSink>,
    lifecycle: Lifecycle,
    storage: Option<Storage<V>>,
    contains_lobs: bool,
    finalized_rows: Option<Rc<Vec<Row<V>>>>,
    cursor: CursorPosition,
    limits_were_applied: bool,
}

impl<V: Value + 'static, S: Session<V>> std::fmt::Debug for ResultBuffer<V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultBuffer")
            .field("columns", &self.columns)
            .field("visible_column_count", &self.visible_column_count)
            .field("distinct", &self.distinct)
            .field("distinct_on", &self.distinct_on)
            .field("sort", &self.sort)
            .field("window", &self.window)
            .field("max_memory_rows", &self.max_memory_rows)
            .field("lifecycle", &self.lifecycle)
            .field("contains_lobs", &self.contains_lobs)
            .field("cursor", &self.cursor)
            .field("limits_were_applied", &self.limits_were_applied)
            .finish_non_exhaustive()
    }
}

impl<V: Value + 'static, S: Session<V>> ResultBuffer<V, S> {
    /// Build a buffer over `columns`, of which the first
    /// `visible_column_count` are returned to a cursor consumer. The
    /// session's own policy (`default_max_memory_rows`, §4.4) seeds the
    /// initial spill threshold; call `set_max_memory_rows` to override it.
    #[must_use]
    pub fn new(columns: Vec<ColumnMeta>, visible_column_count: usize, session: S) -> Self {
        assert!(
            visible_column_count <= columns.len(),
            "visible_column_count exceeds declared column count"
        );
        let max_memory_rows = default_max_memory_rows(&session);
        Self {
            columns,
            visible_column_count,
            distinct: false,
            distinct_on: None,
            sort: None,
            window: WindowSpec::default(),
            max_memory_rows,
            spill_backend_factory: default_spill_factory(),
            session,
            metrics: Box::new(NullSink),
            lifecycle: Lifecycle::Building,
            storage: Some(Storage::Memory(MemoryRows::Plain(Vec::new()))),
            contains_lobs: false,
            finalized_rows: None,
            cursor: CursorPosition::BeforeFirst,
            limits_were_applied: false,
        }
    }

    #[must_use]
    pub fn with_metrics_sink(mut self, sink: impl MetricsSink + 'static) -> Self {
        self.metrics = Box::new(sink);
        self
    }

    #[must_use]
    pub fn with_spill_backend_factory(
        mut self,
        factory: impl Fn() -> Box<dyn SpillBackend<V>> + 'static,
    ) -> Self {
        self.spill_backend_factory = Box::new(factory);
        self
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    #[must_use]
    pub const fn visible_column_count(&self) -> usize {
        self.visible_column_count
    }

    #[must_use]
    pub const fn contains_lobs(&self) -> bool {
        self.contains_lobs
    }

    #[must_use]
    pub const fn limits_were_applied(&self) -> bool {
        self.limits_were_applied
    }

    fn ensure_building(&self) -> Result<(), BufferError> {
        match self.lifecycle {
            Lifecycle::Building => Ok(()),
            Lifecycle::Finalized => Err(BufferError::invalid_state(
                ErrorOrigin::Buffer,
                "operation requires the Building state; done() was already called",
            )),
            Lifecycle::Closed => Err(BufferError::invalid_state(
                ErrorOrigin::Buffer,
                "buffer is closed",
            )),
        }
    }

    fn ensure_finalized(&self) -> Result<(), BufferError> {
        match self.lifecycle {
            Lifecycle::Finalized => Ok(()),
            Lifecycle::Building => Err(BufferError::invalid_state(
                ErrorOrigin::Buffer,
                "cursor operation requires done() to have been called",
            )),
            Lifecycle::Closed => Err(BufferError::invalid_state(
                ErrorOrigin::Buffer,
                "buffer is closed",
            )),
        }
    }

    // ---- configuration (Building only) ----

    pub fn configure_distinct(&mut self, enabled: bool) -> Result<(), BufferError> {
        self.ensure_building()?;
        if self.row_count() > 0 {
            return Err(BufferError::invalid_state(
                ErrorOrigin::Distinct,
                "distinct mode cannot change after rows were added",
            ));
        }
        self.distinct = enabled;
        if !enabled {
            self.distinct_on = None;
        }
        self.storage = Some(Storage::Memory(if enabled {
            MemoryRows::Distinct(DistinctIndex::new())
        } else {
            MemoryRows::Plain(Vec::new())
        }));
        Ok(())
    }

    pub fn configure_distinct_on(&mut self, indexes: Vec<usize>) -> Result<(), BufferError> {
        self.ensure_building()?;
        if self.row_count() > 0 {
            return Err(BufferError::invalid_state(
                ErrorOrigin::Distinct,
                "distinct-on columns cannot change after rows were added",
            ));
        }
        self.distinct = true;
        self.distinct_on = Some(indexes);
        self.storage = Some(Storage::Memory(MemoryRows::Distinct(DistinctIndex::new())));
        Ok(())
    }

    pub fn set_sort(&mut self, order: SortOrder) -> Result<(), BufferError> {
        self.ensure_building()?;
        self.sort = Some(order);
        Ok(())
    }

    pub fn set_offset(&mut self, offset: usize) -> Result<(), BufferError> {
        self.ensure_building()?;
        self.window.offset = offset;
        Ok(())
    }

    pub fn set_limit(&mut self, limit: Option<usize>) -> Result<(), BufferError> {
        self.ensure_building()?;
        self.window.limit = limit;
        Ok(())
    }

    pub fn set_fetch_percent(&mut self, enabled: bool) -> Result<(), BufferError> {
        self.ensure_building()?;
        self.window.fetch_percent = enabled;
        Ok(())
    }

    pub fn set_with_ties(&mut self, enabled: bool) -> Result<(), BufferError> {
        self.ensure_building()?;
        self.window.with_ties = enabled;
        Ok(())
    }

    pub fn set_max_memory_rows(&mut self, n: Option<usize>) -> Result<(), BufferError> {
        self.ensure_building()?;
        self.max_memory_rows = n;
        self.maybe_promote_to_spill()?;
        Ok(())
    }

    // ---- insertion (Building only) ----

    fn compute_key(&self, row: &Row<V>) -> Option<RowKey<V>> {
        if let Some(indexes) = &self.distinct_on {
            Some(row.project_key(indexes))
        } else if self.distinct {
            Some(row.visible_key())
        } else {
            None
        }
    }

    #[must_use]
    pub fn row_count(&self) -> u64 {
        match &self.lifecycle {
            Lifecycle::Building => match self.storage.as_ref() {
                Some(Storage::Memory(MemoryRows::Distinct(idx))) => idx.len() as u64,
                Some(Storage::Memory(MemoryRows::Plain(rows))) => rows.len() as u64,
                Some(Storage::Spilled(backend)) => backend.row_count(),
                None => 0,
            },
            Lifecycle::Finalized => self
                .finalized_rows
                .as_ref()
                .map_or(0, |rows| rows.len() as u64),
            Lifecycle::Closed => 0,
        }
    }

    pub fn add_row(&mut self, values: Vec<V>) -> Result<(), BufferError> {
        self.ensure_building()?;
        let mut row = Row::new(values, self.visible_column_count);
        if materialize_row(&mut row, &mut self.session) {
            self.contains_lobs = true;
        }
        let key = self.compute_key(&row);

        let storage = self
            .storage
            .as_mut()
            .expect("storage is always Some while Building");
        match storage {
            Storage::Memory(MemoryRows::Distinct(idx)) => {
                let k = key.clone().expect("distinct storage always has a key");
                if !idx.insert_if_absent(k.clone(), row) {
                    self.metrics
                        .record(BufferEvent::RowDeduped { key_hash: hash_key(&k) });
                    return Ok(());
                }
            }
            Storage::Memory(MemoryRows::Plain(rows)) => rows.push(row),
            Storage::Spilled(backend) => {
                backend.add_row(key.as_ref(), row)?;
            }
        }

        self.metrics.record(BufferEvent::RowAdded {
            row_count: self.row_count(),
        });
        self.maybe_promote_to_spill()?;
        Ok(())
    }

    fn maybe_promote_to_spill(&mut self) -> Result<(), BufferError> {
        let Some(max) = self.max_memory_rows else {
            return Ok(());
        };
        if !matches!(self.storage, Some(Storage::Memory(_))) {
            return Ok(());
        }
        if self.row_count() as usize <= max {
            return Ok(());
        }

        let memory = match self.storage.take() {
            Some(Storage::Memory(mem)) => mem,
            _ => unreachable!("checked Memory above"),
        };
        let rows: Vec<Row<V>> = match memory {
            MemoryRows::Distinct(mut idx) => idx.drain_in_order(),
            MemoryRows::Plain(rows) => rows,
        };

        let transferred = rows.len() as u64;
        let pairs: Vec<(Option<RowKey<V>>, Row<V>)> = rows
            .into_iter()
            .map(|row| {
                let key = self.compute_key(&row);
                (key, row)
            })
            .collect();

        let mut backend = (self.spill_backend_factory)();
        backend.add_rows(pairs)?;
        self.storage = Some(Storage::Spilled(backend));
        self.metrics.record(BufferEvent::SpillPromoted {
            rows_transferred: transferred,
        });
        Ok(())
    }

    /// Remove the row matching `values`, under whatever key shape the
    /// buffer is currently configured with (`visible_key` or
    /// `distinct_on`'s projection). Callers never build a `RowKey`
    /// themselves — the buffer derives it the same way `add_row` does.
    pub fn remove_distinct_row(&mut self, values: &[V]) -> Result<bool, BufferError> {
        self.ensure_building()?;
        if !self.distinct {
            return Err(BufferError::invalid_state(
                ErrorOrigin::Distinct,
                "remove_distinct_row requires distinct mode",
            ));
        }
        let row = Row::new(values.to_vec(), self.visible_column_count);
        let key = self
            .compute_key(&row)
            .expect("distinct mode always yields a key");
        match self
            .storage
            .as_mut()
            .expect("storage is always Some while Building")
        {
            Storage::Memory(MemoryRows::Distinct(idx)) => Ok(idx.remove(&key)),
            Storage::Memory(MemoryRows::Plain(_)) => {
                unreachable!("distinct mode always uses Distinct storage")
            }
            Storage::Spilled(backend) => {
                let existed = backend.contains(&key)?;
                if existed {
                    backend.remove_row(&key)?;
                }
                Ok(existed)
            }
        }
    }

    /// Returns whether a row matching `values` is already present, under
    /// the buffer's configured distinct key shape. See
    /// `remove_distinct_row` for why this takes row values rather than a
    /// pre-built `RowKey`.
    pub fn contains_distinct(&self, values: &[V]) -> Result<bool, BufferError> {
        self.ensure_building()?;
        if !self.distinct {
            return Err(BufferError::invalid_state(
                ErrorOrigin::Distinct,
                "contains_distinct requires distinct mode",
            ));
        }
        let row = Row::new(values.to_vec(), self.visible_column_count);
        let key = self
            .compute_key(&row)
            .expect("distinct mode always yields a key");
        match self
            .storage
            .as_ref()
            .expect("storage is always Some while Building")
        {
            Storage::Memory(MemoryRows::Distinct(idx)) => Ok(idx.contains(&key)),
            Storage::Memory(MemoryRows::Plain(_)) => {
                unreachable!("distinct mode always uses Distinct storage")
            }
            Storage::Spilled(backend) => backend.contains(&key),
        }
    }

    // ---- finalization ----

    /// Flush residual rows, apply the configured sort and window, and
    /// transition to `Finalized`. Idempotent calls are rejected: `done()`
    /// is a one-way lifecycle transition (§4.3).
    pub fn done(&mut self) -> Result<(), BufferError> {
        self.ensure_building()?;
        let storage = self
            .storage
            .take()
            .expect("storage is always Some while Building");
        let mut rows: Vec<Row<V>> = match storage {
            Storage::Memory(MemoryRows::Distinct(mut idx)) => idx.drain_in_order(),
            Storage::Memory(MemoryRows::Plain(rows)) => rows,
            Storage::Spilled(mut backend) => {
                backend.reset()?;
                let mut drained = Vec::with_capacity(backend.row_count() as usize);
                while let Some(row) = backend.next()? {
                    drained.push(row);
                }
                backend.close();
                drained
            }
        };

        self.metrics.record(BufferEvent::ResidualFlushed {
            rows_flushed: rows.len() as u64,
        });

        let row_count = rows.len();
        let effective_limit = self.window.effective_limit(row_count)?;

        if let Some(order) = &self.sort {
            if self.window.with_ties {
                // WITH TIES needs a fully correct relative order past the
                // nominal window boundary to find where ties end.
                full_sort(&mut rows, order);
            } else {
                let window_len =
                    effective_limit.map_or(row_count.saturating_sub(self.window.offset), |l| l);
                partial_sort_window(&mut rows, self.window.offset, window_len, order);
            }
        }

        let (start, mut len) = self.window.keep_range(effective_limit, row_count);
        if self.window.with_ties && len > 0 {
            if let Some(order) = &self.sort {
                len = extend_for_ties(&rows, order, start, len);
            }
        }

        let kept = len as u64;
        self.metrics.record(BufferEvent::WindowApplied {
            kept,
            dropped: row_count as u64 - kept,
        });

        self.limits_were_applied = self.window.offset > 0 || effective_limit.is_some();
        let final_rows: Vec<Row<V>> = rows.drain(start..start + len).collect();
        self.finalized_rows = Some(Rc::new(final_rows));
        self.lifecycle = Lifecycle::Finalized;
        self.cursor = CursorPosition::BeforeFirst;
        Ok(())
    }

    // ---- cursor (Finalized only) ----

    pub fn reset(&mut self) -> Result<(), BufferError> {
        self.ensure_finalized()?;
        self.cursor = CursorPosition::BeforeFirst;
        Ok(())
    }

    pub fn next(&mut self) -> Result<Option<&Row<V>>, BufferError> {
        self.ensure_finalized()?;
        let len = self.finalized_rows.as_ref().map_or(0, |rows| rows.len());
        self.cursor = match self.cursor {
            CursorPosition::BeforeFirst => {
                if len == 0 {
                    CursorPosition::AfterLast
                } else {
                    CursorPosition::At(0)
                }
            }
            CursorPosition::At(i) if i + 1 < len => CursorPosition::At(i + 1),
            CursorPosition::At(_) | CursorPosition::AfterLast => CursorPosition::AfterLast,
        };
        Ok(self.current_row())
    }

    #[must_use]
    pub fn current_row(&self) -> Option<&Row<V>> {
        match self.cursor {
            CursorPosition::At(i) => self.finalized_rows.as_ref().and_then(|rows| rows.get(i)),
            CursorPosition::BeforeFirst | CursorPosition::AfterLast => None,
        }
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        let len = self.finalized_rows.as_ref().map_or(0, |rows| rows.len());
        match self.cursor {
            CursorPosition::BeforeFirst => len > 0,
            CursorPosition::At(i) => i + 1 < len,
            CursorPosition::AfterLast => false,
        }
    }

    #[must_use]
    pub const fn is_after_last(&self) -> bool {
        matches!(self.cursor, CursorPosition::AfterLast)
    }

    #[must_use]
    pub fn row_id(&self) -> Option<usize> {
        match self.cursor {
            CursorPosition::At(i) => Some(i + 1),
            CursorPosition::BeforeFirst | CursorPosition::AfterLast => None,
        }
    }

    /// Produce an independent cursor over the same finalized row sequence,
    /// pinned to `target_session` (§4.7: "shallow-copy(targetSession)").
    /// Requires the buffer to already be `Finalized` and to carry no LOB
    /// values: two cursors must never share one session-pinned LOB handle
    /// (§4.6/§4.7), so a LOB-bearing buffer always refuses. Clears the
    /// window parameters on the copy — offset/limit/fetch-percent/with-ties
    /// are a per-cursor concern, not part of what a shallow copy inherits.
    pub fn shallow_copy(&self, target_session: S) -> Result<Self, BufferError> {
        if !matches!(self.lifecycle, Lifecycle::Finalized) {
            self.metrics.record(BufferEvent::ShallowCopyRefused);
            return Err(BufferError::invalid_state(
                ErrorOrigin::Buffer,
                "shallow_copy requires a finalized buffer",
            ));
        }
        if self.contains_lobs {
            self.metrics.record(BufferEvent::ShallowCopyRefused);
            return Err(BufferError::invalid_state(
                ErrorOrigin::Buffer,
                "shallow_copy refused: buffer contains session-pinned LOB values",
            ));
        }
        let Some(rows) = &self.finalized_rows else {
            self.metrics.record(BufferEvent::ShallowCopyRefused);
            return Err(BufferError::invalid_state(
                ErrorOrigin::Buffer,
                "shallow_copy requires materialized rows",
            ));
        };

        self.metrics.record(BufferEvent::ShallowCopyGranted);
        Ok(Self {
            columns: self.columns.clone(),
            visible_column_count: self.visible_column_count,
            distinct: self.distinct,
            distinct_on: self.distinct_on.clone(),
            sort: self.sort.clone(),
            window: WindowSpec::default(),
            max_memory_rows: self.max_memory_rows,
            spill_backend_factory: default_spill_factory(),
            session: target_session,
            metrics: Box::new(NullSink),
            lifecycle: Lifecycle::Finalized,
            storage: None,
            contains_lobs: false,
            finalized_rows: Some(Rc::clone(rows)),
            cursor: CursorPosition::BeforeFirst,
            limits_were_applied: false,
        })
    }

    pub fn close(&mut self) {
        if matches!(self.lifecycle, Lifecycle::Closed) {
            return;
        }
        if let Some(Storage::Spilled(mut backend)) = self.storage.take() {
            backend.close();
        }
        self.finalized_rows = None;
        self.lifecycle = Lifecycle::Closed;
        self.metrics.record(BufferEvent::Closed);
    }
}

#[cfg(test)]
mod tests {
    use super::ResultBuffer;
    use crate::obs::tests_support::RecordingSink;
    use crate::session::TestSession;
    use crate::sort::{SortColumn, SortOrder};
    use crate::value::{ColumnMeta, ScalarValue, SqlType};

    fn columns(n: usize) -> Vec<ColumnMeta> {
        (0..n)
            .map(|i| ColumnMeta::simple(&format!("c{i}"), SqlType::BigInt))
            .collect()
    }

    fn int_values(vs: &[i64]) -> Vec<ScalarValue> {
        vs.iter().map(|&v| ScalarValue::Int(v)).collect()
    }

    fn new_buffer(n_columns: usize) -> ResultBuffer<ScalarValue, TestSession<ScalarValue>> {
        ResultBuffer::new(columns(n_columns), n_columns, TestSession::new())
    }

    fn scan_ints(buf: &mut ResultBuffer<ScalarValue, TestSession<ScalarValue>>) -> Vec<i64> {
        let mut out = Vec::new();
        while let Some(row) = buf.next().unwrap() {
            out.push(match row.value_at(0) {
                Some(ScalarValue::Int(i)) => *i,
                other => panic!("expected int, got {other:?}"),
            });
        }
        out
    }

    // spec.md §8 scenario 1: distinct, no sort, preserves insertion order.
    #[test]
    fn scenario_distinct_preserves_insertion_order_without_sort() {
        let mut buf = new_buffer(1);
        buf.configure_distinct(true).unwrap();
        for v in [3, 1, 3, 2, 1, 4] {
            buf.add_row(int_values(&[v])).unwrap();
        }
        buf.done().unwrap();
        assert_eq!(scan_ints(&mut buf), vec![3, 1, 2, 4]);
    }

    // spec.md §8 scenario 2: sort then OFFSET/FETCH.
    #[test]
    fn scenario_sort_with_offset_and_fetch() {
        let mut buf = new_buffer(1);
        buf.set_sort(SortOrder::new(vec![SortColumn::asc(0)]))
            .unwrap();
        buf.set_offset(2).unwrap();
        buf.set_limit(Some(3)).unwrap();
        for v in [5, 3, 8, 1, 4, 9, 2] {
            buf.add_row(int_values(&[v])).unwrap();
        }
        buf.done().unwrap();
        assert_eq!(scan_ints(&mut buf), vec![3, 4, 5]);
        assert!(buf.limits_were_applied());
    }

    // spec.md §8 scenario 3: WITH TIES extends the window.
    #[test]
    fn scenario_with_ties_keeps_all_tied_rows() {
        let mut buf = ResultBuffer::<ScalarValue, TestSession<ScalarValue>>::new(
            columns(2),
            2,
            TestSession::new(),
        );
        buf.set_sort(SortOrder::new(vec![SortColumn::asc(0)]))
            .unwrap();
        buf.set_limit(Some(2)).unwrap();
        buf.set_with_ties(true).unwrap();
        for (n, tag) in [(10, "a"), (20, "b"), (20, "c"), (20, "d"), (30, "e")] {
            buf.add_row(vec![ScalarValue::Int(n), ScalarValue::Text(tag.into())])
                .unwrap();
        }
        buf.done().unwrap();
        assert_eq!(buf.row_count(), 4);
    }

    // spec.md §8 scenario 4: FETCH PERCENT rounds up.
    #[test]
    fn scenario_fetch_percent_rounds_up() {
        let mut buf = new_buffer(1);
        buf.set_sort(SortOrder::new(vec![SortColumn::asc(0)]))
            .unwrap();
        buf.set_limit(Some(25)).unwrap();
        buf.set_fetch_percent(true).unwrap();
        for v in 1..=10 {
            buf.add_row(int_values(&[v])).unwrap();
        }
        buf.done().unwrap();
        assert_eq!(buf.row_count(), 3);
    }

    // spec.md §8 scenario 5: exceeding max_memory_rows promotes to spill
    // transparently; the resulting scan is unaffected.
    #[test]
    fn scenario_spill_promotion_is_transparent_to_the_scan() {
        let session = TestSession::<ScalarValue>::new().with_max_memory_rows(3);
        let mut buf = ResultBuffer::new(columns(1), 1, session);
        for v in 1..=6 {
            buf.add_row(int_values(&[v])).unwrap();
        }
        buf.done().unwrap();
        assert_eq!(scan_ints(&mut buf), vec![1, 2, 3, 4, 5, 6]);
    }

    // spec.md §8 scenario 6: distinct-on-indexes uniqueness survives a
    // promotion to spill mid-insertion. The exact row retained at the
    // in-memory/spilled boundary for a duplicate key is implementation
    // defined (first-wins on both sides of the boundary in this backend);
    // what's invariant is that no duplicate key survives.
    #[test]
    fn scenario_distinct_on_indexes_unique_across_spill_boundary() {
        let session = TestSession::<ScalarValue>::new().with_max_memory_rows(2);
        let mut buf = ResultBuffer::new(columns(2), 2, session);
        buf.configure_distinct_on(vec![0]).unwrap();
        for (k, v) in [(1, 100), (2, 200), (1, 999), (3, 300), (2, 888)] {
            buf.add_row(vec![ScalarValue::Int(k), ScalarValue::Int(v)])
                .unwrap();
        }
        buf.done().unwrap();
        assert_eq!(buf.row_count(), 3);
    }

    #[test]
    fn row_count_after_done_equals_cursor_length() {
        let mut buf = new_buffer(1);
        for v in [1, 2, 3, 4] {
            buf.add_row(int_values(&[v])).unwrap();
        }
        buf.done().unwrap();
        let expected = buf.row_count();
        let scanned = scan_ints(&mut buf).len() as u64;
        assert_eq!(expected, scanned);
    }

    #[test]
    fn memory_bound_allows_exactly_one_row_past_threshold_before_promoting() {
        let session = TestSession::<ScalarValue>::new().with_max_memory_rows(2);
        let mut buf = ResultBuffer::new(columns(1), 1, session);
        buf.add_row(int_values(&[1])).unwrap();
        buf.add_row(int_values(&[2])).unwrap();
        // still under the in-memory path at exactly the threshold
        assert_eq!(buf.row_count(), 2);
        buf.add_row(int_values(&[3])).unwrap();
        // the third row forces promotion
        assert_eq!(buf.row_count(), 3);
    }

    #[test]
    fn close_is_idempotent_and_zeroes_row_count() {
        let mut buf = new_buffer(1);
        buf.add_row(int_values(&[1])).unwrap();
        buf.done().unwrap();
        buf.close();
        buf.close();
        assert_eq!(buf.row_count(), 0);
    }

    #[test]
    fn shallow_copy_yields_an_independent_cursor_over_identical_rows() {
        let mut buf = new_buffer(1);
        for v in [1, 2, 3] {
            buf.add_row(int_values(&[v])).unwrap();
        }
        buf.done().unwrap();
        buf.next().unwrap(); // advance the original cursor

        let mut copy = buf.shallow_copy(TestSession::new()).unwrap();
        assert_eq!(scan_ints(&mut copy), vec![1, 2, 3]);
    }

    #[test]
    fn shallow_copy_before_done_is_rejected() {
        let buf = new_buffer(1);
        let err = buf.shallow_copy(TestSession::new()).unwrap_err();
        assert!(err.is_invalid_state());
    }

    #[test]
    fn shallow_copy_clears_window_parameters() {
        let mut buf = new_buffer(1);
        buf.set_offset(1).unwrap();
        buf.set_limit(Some(1)).unwrap();
        for v in [1, 2, 3] {
            buf.add_row(int_values(&[v])).unwrap();
        }
        buf.done().unwrap();
        assert!(buf.limits_were_applied());

        let copy = buf.shallow_copy(TestSession::new()).unwrap();
        assert!(!copy.limits_were_applied());
    }

    #[test]
    fn shallow_copy_refuses_a_lob_bearing_buffer() {
        let mut buf: ResultBuffer<ScalarValue, TestSession<ScalarValue>> =
            ResultBuffer::new(columns(1), 1, TestSession::new());
        buf.add_row(vec![ScalarValue::LobPending(7)]).unwrap();
        buf.done().unwrap();
        assert!(buf.contains_lobs());

        let err = buf.shallow_copy(TestSession::new()).unwrap_err();
        assert!(err.is_invalid_state());
    }

    #[test]
    fn add_row_after_done_is_invalid_state() {
        let mut buf = new_buffer(1);
        buf.done().unwrap();
        let err = buf.add_row(int_values(&[1])).unwrap_err();
        assert!(err.is_invalid_state());
    }

    #[test]
    fn metrics_sink_observes_row_added_and_closed_events() {
        let mut buf = new_buffer(1).with_metrics_sink(RecordingSink::default());
        buf.add_row(int_values(&[1])).unwrap();
        buf.done().unwrap();
        buf.close();
        // Sink moved into the buffer: assert indirectly via lifecycle
        // behavior rather than inspecting events after the move.
        assert_eq!(buf.row_count(), 0);
    }

    #[test]
    fn remove_distinct_row_requires_distinct_mode() {
        let mut buf = new_buffer(1);
        let err = buf.remove_distinct_row(&int_values(&[1])).unwrap_err();
        assert!(err.is_invalid_state());
    }

    #[test]
    fn remove_and_contains_distinct_derive_the_key_from_distinct_on_projection() {
        let mut buf: ResultBuffer<ScalarValue, TestSession<ScalarValue>> =
            ResultBuffer::new(columns(2), 2, TestSession::new());
        buf.configure_distinct_on(vec![0]).unwrap();
        buf.add_row(vec![ScalarValue::Int(1), ScalarValue::Int(100)])
            .unwrap();

        // The lookup key is projected onto column 0 only, not the full
        // visible row — passing the full row's values must still resolve.
        assert!(
            buf.contains_distinct(&[ScalarValue::Int(1), ScalarValue::Int(999)])
                .unwrap()
        );
        assert!(
            buf.remove_distinct_row(&[ScalarValue::Int(1), ScalarValue::Int(999)])
                .unwrap()
        );
        assert!(
            !buf.contains_distinct(&[ScalarValue::Int(1), ScalarValue::Int(999)])
                .unwrap()
        );
    }

    #[test]
    fn distinct_mode_cannot_change_after_rows_added() {
        let mut buf = new_buffer(1);
        buf.add_row(int_values(&[1])).unwrap();
        let err = buf.configure_distinct(true).unwrap_err();
        assert!(err.is_invalid_state());
    }

    mod props {
        use super::{columns, new_buffer};
        use crate::session::TestSession;
        use crate::value::ScalarValue;
        use crate::ResultBuffer;
        use proptest::prelude::*;
        use std::collections::HashSet;

        proptest! {
            // No distinct, no sort: every inserted value comes back exactly
            // once per occurrence, in insertion order (round trip).
            #[test]
            fn round_trip_scan_sees_every_row_exactly_once(values in proptest::collection::vec(-100i64..100, 0..200)) {
                let mut buf = new_buffer(1);
                for &v in &values {
                    buf.add_row(vec![ScalarValue::Int(v)]).unwrap();
                }
                buf.done().unwrap();

                let mut scanned = Vec::new();
                while let Some(row) = buf.next().unwrap() {
                    match row.value_at(0) {
                        Some(ScalarValue::Int(i)) => scanned.push(*i),
                        other => panic!("expected int, got {other:?}"),
                    }
                }
                prop_assert_eq!(scanned, values);
            }

            // Regardless of the spill threshold, every inserted row is
            // still present after done() — promotion never loses rows.
            #[test]
            fn memory_bound_never_drops_rows(
                values in proptest::collection::vec(-100i64..100, 0..200),
                threshold in 1usize..20,
            ) {
                let session = TestSession::<ScalarValue>::new().with_max_memory_rows(threshold);
                let mut buf = ResultBuffer::new(columns(1), 1, session);
                for &v in &values {
                    buf.add_row(vec![ScalarValue::Int(v)]).unwrap();
                }
                buf.done().unwrap();
                prop_assert_eq!(buf.row_count() as usize, values.len());
            }

            // Distinct mode: the output is exactly the set of distinct
            // values, each appearing once, in first-seen order.
            #[test]
            fn distinct_ordering_keeps_first_seen_order(values in proptest::collection::vec(-20i64..20, 0..200)) {
                let mut buf = new_buffer(1);
                buf.configure_distinct(true).unwrap();
                for &v in &values {
                    buf.add_row(vec![ScalarValue::Int(v)]).unwrap();
                }
                buf.done().unwrap();

                let mut expected = Vec::new();
                let mut seen = HashSet::new();
                for v in &values {
                    if seen.insert(*v) {
                        expected.push(*v);
                    }
                }

                let mut scanned = Vec::new();
                while let Some(row) = buf.next().unwrap() {
                    match row.value_at(0) {
                        Some(ScalarValue::Int(i)) => scanned.push(*i),
                        other => panic!("expected int, got {other:?}"),
                    }
                }
                prop_assert_eq!(scanned, expected);
            }
        }
    }
}
