//! Module: window
//! Responsibility: OFFSET / FETCH / PERCENT / WITH TIES arithmetic (§4.5).
//! Does not own: sorting itself (`sort` module) or where the window is
//! sliced from (in-memory vs. backend replay — `buffer`'s job).
//! Boundary: pure functions over row counts and, for WITH TIES, a borrowed
//! row slice plus comparator; no mutation.

use crate::error::BufferError;
use crate::row::Row;
use crate::sort::SortOrder;
use crate::value::Value;

///
/// WindowSpec
///
/// The four window parameters `spec.md` §4.1 lets a caller configure before
/// `done()`. `limit = None` means unbounded; `limit = Some(0)` means an
/// empty result.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct WindowSpec {
    pub offset: usize,
    pub limit: Option<usize>,
    pub fetch_percent: bool,
    pub with_ties: bool,
}

impl WindowSpec {
    /// Resolve the configured `limit` against `fetch_percent` and the
    /// pre-window row count. Oracle rounding: `ceil(limit * row_count / 100)`
    /// computed as `(limit * row_count + 99) / 100` in integer arithmetic.
    pub fn effective_limit(&self, row_count: usize) -> Result<Option<usize>, BufferError> {
        let Some(limit) = self.limit else {
            return Ok(None);
        };

        if !self.fetch_percent {
            return Ok(Some(limit));
        }

        if limit > 100 {
            return Err(BufferError::invalid_value("FETCH PERCENT", limit));
        }

        let effective = limit
            .saturating_mul(row_count)
            .saturating_add(99)
            / 100;
        Ok(Some(effective))
    }

    /// The normal (pre-TIES) keep window: `[start, start + len)`. Empty when
    /// `offset >= row_count` or the effective limit is zero.
    #[must_use]
    pub fn keep_range(&self, effective_limit: Option<usize>, row_count: usize) -> (usize, usize) {
        if self.offset >= row_count || effective_limit == Some(0) {
            return (0, 0);
        }

        let available = row_count - self.offset;
        let len = effective_limit.map_or(available, |limit| limit.min(available));
        (self.offset, len)
    }
}

/// Extend a chosen `[start, start + len)` window's tail while subsequent
/// rows compare equal, under `order`, to the last row already included.
/// Requires a sort — callers must not invoke this without one (§4.5: "WITH
/// TIES requires a sort").
#[must_use]
pub fn extend_for_ties<V: Value>(
    rows: &[Row<V>],
    order: &SortOrder,
    start: usize,
    len: usize,
) -> usize {
    if len == 0 {
        return 0;
    }

    let mut end = start + len;
    let Some(last_kept) = rows.get(end - 1) else {
        return len;
    };

    while let Some(candidate) = rows.get(end) {
        if order.compare(candidate, last_kept) == std::cmp::Ordering::Equal {
            end += 1;
        } else {
            break;
        }
    }

    end - start
}

#[cfg(test)]
mod tests {
    use super::{WindowSpec, extend_for_ties};
    use crate::row::Row;
    use crate::sort::{SortColumn, SortOrder, full_sort};
    use crate::value::ScalarValue;

    fn int_row(v: i64) -> Row<ScalarValue> {
        Row::new(vec![ScalarValue::Int(v)], 1)
    }

    #[test]
    fn sort_then_offset_fetch_scenario() {
        // spec.md §8 scenario 2
        let mut rows: Vec<Row<ScalarValue>> =
            [5, 3, 8, 1, 4, 9, 2].into_iter().map(int_row).collect();
        let order = SortOrder::new(vec![SortColumn::asc(0)]);
        full_sort(&mut rows, &order);

        let spec = WindowSpec {
            offset: 2,
            limit: Some(3),
            ..Default::default()
        };
        let effective = spec.effective_limit(rows.len()).unwrap();
        let (start, len) = spec.keep_range(effective, rows.len());
        let kept: Vec<i64> = rows[start..start + len]
            .iter()
            .map(|r| match r.value_at(0) {
                Some(ScalarValue::Int(i)) => *i,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(kept, vec![3, 4, 5]);
    }

    #[test]
    fn fetch_percent_scenario() {
        // spec.md §8 scenario 4: 10 rows, limit=25 percent => ceil(2.5) = 3
        let mut rows: Vec<Row<ScalarValue>> = (1..=10).map(int_row).collect();
        let order = SortOrder::new(vec![SortColumn::asc(0)]);
        full_sort(&mut rows, &order);

        let spec = WindowSpec {
            offset: 0,
            limit: Some(25),
            fetch_percent: true,
            with_ties: false,
        };
        let effective = spec.effective_limit(rows.len()).unwrap();
        assert_eq!(effective, Some(3));
        let (start, len) = spec.keep_range(effective, rows.len());
        assert_eq!((start, len), (0, 3));
    }

    #[test]
    fn fetch_percent_out_of_range_is_invalid_value() {
        let spec = WindowSpec {
            limit: Some(101),
            fetch_percent: true,
            ..Default::default()
        };
        let err = spec.effective_limit(10).unwrap_err();
        assert!(err.is_invalid_state() == false);
    }

    #[test]
    fn with_ties_extends_past_nominal_window_end() {
        // spec.md §8 scenario 3
        let values = [(10, 'a'), (20, 'b'), (20, 'c'), (20, 'd'), (30, 'e')];
        let mut rows: Vec<Row<ScalarValue>> = values
            .iter()
            .map(|(n, tag)| {
                Row::new(
                    vec![ScalarValue::Int(*n), ScalarValue::Text(tag.to_string())],
                    2,
                )
            })
            .collect();
        let order = SortOrder::new(vec![SortColumn::asc(0)]);
        full_sort(&mut rows, &order);

        let spec = WindowSpec {
            offset: 0,
            limit: Some(2),
            with_ties: true,
            fetch_percent: false,
        };
        let effective = spec.effective_limit(rows.len()).unwrap();
        let (start, len) = spec.keep_range(effective, rows.len());
        let extended_len = extend_for_ties(&rows, &order, start, len);
        assert_eq!(extended_len, 4);
    }

    #[test]
    fn empty_window_when_offset_exceeds_row_count() {
        let spec = WindowSpec {
            offset: 100,
            limit: Some(5),
            ..Default::default()
        };
        let effective = spec.effective_limit(10).unwrap();
        let (_, len) = spec.keep_range(effective, 10);
        assert_eq!(len, 0);
    }

    #[test]
    fn zero_limit_is_an_empty_window() {
        let spec = WindowSpec {
            offset: 0,
            limit: Some(0),
            ..Default::default()
        };
        let effective = spec.effective_limit(10).unwrap();
        let (_, len) = spec.keep_range(effective, 10);
        assert_eq!(len, 0);
    }
}
