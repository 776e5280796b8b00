//! qbuffer-core
//!
//! A materialized query-result buffer: the component a relational engine's
//! executor hands completed rows to when it needs duplicate elimination,
//! an ORDER BY, an OFFSET/FETCH/PERCENT/WITH TIES window, or transparent
//! promotion from memory to an on-disk backend once a row budget is
//! exceeded. See `buffer::ResultBuffer` for the primary entry point.
//!
//! Out of scope: SQL parsing, plan compilation, transaction/MVCC
//! semantics, and the concrete storage engine behind `spill::SpillBackend`
//! — an embedding engine supplies its own value domain (`value::Value`),
//! session (`session::Session`), and spill backend.

pub mod buffer;
pub mod distinct;
pub mod error;
pub mod hash;
pub mod lob;
pub mod obs;
pub mod row;
pub mod session;
pub mod sort;
pub mod spill;
pub mod value;
pub mod window;

pub use buffer::ResultBuffer;
pub use error::{BufferError, ErrorClass, ErrorOrigin};
pub use row::{Row, RowKey};
pub use session::Session;
pub use sort::{Direction, NullsOrder, SortColumn, SortOrder};
pub use spill::SpillBackend;
pub use value::{ColumnMeta, SqlType, Value};
