//! Module: sort
//! Responsibility: multi-column comparator with null and direction handling,
//! plus the partial-sort primitive `done()` uses when only a window needs to
//! be correctly ordered.
//! Does not own: row storage or windowing policy (offset/limit semantics);
//! only the comparator and the sort-application mechanics.
//! Boundary: operates on `&[Row<V>]` / `&mut [Row<V>]` only.

use crate::row::Row;
use crate::value::Value;
use std::cmp::Ordering;

///
/// Direction
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Asc,
    Desc,
}

///
/// NullsOrder
///
/// Where NULL sorts relative to non-null values within one column, applied
/// before the direction flip (so `NullsFirst` with `Desc` still puts nulls
/// first, matching the common SQL convention of nulls being orthogonal to
/// direction unless the caller asks otherwise).
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NullsOrder {
    First,
    Last,
}

///
/// SortColumn
///

#[derive(Clone, Copy, Debug)]
pub struct SortColumn {
    pub index: usize,
    pub direction: Direction,
    pub nulls: NullsOrder,
}

impl SortColumn {
    #[must_use]
    pub const fn asc(index: usize) -> Self {
        Self {
            index,
            direction: Direction::Asc,
            nulls: NullsOrder::Last,
        }
    }

    #[must_use]
    pub const fn desc(index: usize) -> Self {
        Self {
            index,
            direction: Direction::Desc,
            nulls: NullsOrder::Last,
        }
    }

    #[must_use]
    pub const fn with_nulls(mut self, nulls: NullsOrder) -> Self {
        self.nulls = nulls;
        self
    }
}

///
/// SortOrder
///
/// A multi-column comparator over `Row<V>`. Columns are compared in
/// declaration order; the first non-equal column decides.
///

#[derive(Clone, Debug, Default)]
pub struct SortOrder {
    columns: Vec<SortColumn>,
}

impl SortOrder {
    #[must_use]
    pub const fn new(columns: Vec<SortColumn>) -> Self {
        Self { columns }
    }

    #[must_use]
    pub fn columns(&self) -> &[SortColumn] {
        &self.columns
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Compare two rows under this order. Rows shorter than a referenced
    /// column index compare as equal on that column (defensive; callers
    /// should never construct such a mismatch).
    pub fn compare<V: Value>(&self, a: &Row<V>, b: &Row<V>) -> Ordering {
        for col in &self.columns {
            let (Some(av), Some(bv)) = (a.value_at(col.index), b.value_at(col.index)) else {
                continue;
            };

            let ordering = compare_one_column(av, bv, col);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        Ordering::Equal
    }
}

fn compare_one_column<V: Value>(a: &V, b: &V, col: &SortColumn) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => return Ordering::Equal,
        (true, false) => {
            return match col.nulls {
                NullsOrder::First => Ordering::Less,
                NullsOrder::Last => Ordering::Greater,
            };
        }
        (false, true) => {
            return match col.nulls {
                NullsOrder::First => Ordering::Greater,
                NullsOrder::Last => Ordering::Less,
            };
        }
        (false, false) => {}
    }

    let cmp = a.sql_cmp(b);
    match col.direction {
        Direction::Asc => cmp,
        Direction::Desc => cmp.reverse(),
    }
}

/// Sort the full slice by `order`.
pub fn full_sort<V: Value>(rows: &mut [Row<V>], order: &SortOrder) {
    rows.sort_by(|a, b| order.compare(a, b));
}

/// Sort only enough of `rows` to guarantee the window `[offset,
/// offset + window_len)` is correctly ordered under `order`; the relative
/// order of rows outside the window is left unspecified (§4.3/§4.5).
///
/// `window_len` is the number of rows the window needs, not including any
/// WITH-TIES extension — the caller extends afterwards by scanning forward
/// from the partially-sorted boundary.
pub fn partial_sort_window<V: Value>(rows: &mut [Row<V>], offset: usize, window_len: usize, order: &SortOrder) {
    let boundary = offset.saturating_add(window_len);
    if window_len == 0 || boundary == 0 {
        return;
    }
    if boundary >= rows.len() {
        full_sort(rows, order);
        return;
    }

    rows.select_nth_unstable_by(boundary - 1, |a, b| order.compare(a, b));
    rows[..boundary].sort_by(|a, b| order.compare(a, b));
}
