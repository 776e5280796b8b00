//! Module: value
//! Responsibility: the `Value` capability trait every row element must
//! implement, declared SQL type metadata, and a usable reference value type.
//! Does not own: concrete SQL type systems belonging to an embedding engine;
//! `ScalarValue` is a default, not the only legal implementation.
//! Boundary: `ResultBuffer<V>` is generic over `V: Value`; nothing downstream
//! of this module assumes a concrete representation.

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;

///
/// SqlType
///
/// Declared SQL type tag carried per column. Purely descriptive — the buffer
/// never branches on it except to report it back through column metadata.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SqlType {
    Integer,
    BigInt,
    Numeric { precision: u8, scale: u8 },
    Boolean,
    Text { max_len: Option<u32> },
    Blob,
    Clob,
    Date,
    Timestamp,
    Null,
}

///
/// LobMaterialization
///
/// Result of materializing one value. `Owned` means the buffer must take
/// ownership for its full lifetime and register the replacement with the
/// session's temporary-LOB list (see `lob` module); `Identity` means the
/// value is self-contained and no registration is needed.
///

pub enum LobMaterialization<V> {
    Identity,
    Owned(V),
}

///
/// Value
///
/// Capability trait for one opaque SQL datum. Required: equality, hashing
/// (for use as a row-key element), a declared type, a comparator usable by
/// `SortOrder`, and LOB materialization.
///

pub trait Value: Clone + fmt::Debug + Eq + Hash {
    /// The declared SQL type of this value.
    fn sql_type(&self) -> SqlType;

    /// SQL NULL is excluded from ordinary comparison and sorts according to
    /// the `SortOrder`'s configured null placement, not this method.
    fn is_null(&self) -> bool;

    /// Comparator for two non-null values of (expected) compatible type.
    /// Implementations should return a total order; mixed-type comparisons
    /// are implementation-defined but must be deterministic.
    fn sql_cmp(&self, other: &Self) -> Ordering;

    /// True when this value owns out-of-line bytes (BLOB/CLOB) whose
    /// lifetime must be pinned to one session. Defaults to `false`.
    fn is_lob(&self) -> bool {
        false
    }

    /// Copy-on-materialize hook. The default never replaces the value.
    /// LOB-bearing implementations override this to return
    /// `LobMaterialization::Owned` with a session-owned handle.
    fn materialize(&self) -> LobMaterialization<Self>
    where
        Self: Sized,
    {
        LobMaterialization::Identity
    }
}

///
/// LobHandle
///
/// Opaque session-owned identifier for one materialized LOB payload. The
/// buffer never looks inside it; only the session interprets it.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct LobHandle(pub u64);

///
/// ScalarValue
///
/// Reference `Value` implementation covering the common SQL scalar domain.
/// Provided so the buffer is directly usable without defining a bespoke
/// value type, and used throughout this crate's own tests.
///

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    /// An un-materialized large object: `(session_tag)` is an opaque token
    /// identifying where the backing bytes currently live, e.g. a staging
    /// buffer owned by the expression layer above this crate.
    LobPending(u64),
    /// A materialized large object: a handle owned by the session's
    /// temporary-LOB list.
    LobOwned(LobHandle),
}

impl ScalarValue {
    #[must_use]
    pub const fn is_lob_variant(&self) -> bool {
        matches!(self, Self::LobPending(_) | Self::LobOwned(_))
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::LobPending(tag) => write!(f, "<lob pending {tag}>"),
            Self::LobOwned(handle) => write!(f, "<lob {}>", handle.0),
        }
    }
}

impl Value for ScalarValue {
    fn sql_type(&self) -> SqlType {
        match self {
            Self::Null => SqlType::Null,
            Self::Bool(_) => SqlType::Boolean,
            Self::Int(_) => SqlType::BigInt,
            Self::Text(_) => SqlType::Text { max_len: None },
            Self::LobPending(_) | Self::LobOwned(_) => SqlType::Clob,
        }
    }

    fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    fn sql_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::LobOwned(a), Self::LobOwned(b)) => a.cmp(b),
            (Self::LobPending(a), Self::LobPending(b)) => a.cmp(b),
            (Self::Null, Self::Null) => Ordering::Equal,
            // Mixed-variant comparisons are deterministic but arbitrary:
            // rank by discriminant so sorts stay total.
            _ => self.variant_rank().cmp(&other.variant_rank()),
        }
    }

    fn is_lob(&self) -> bool {
        self.is_lob_variant()
    }

    fn materialize(&self) -> LobMaterialization<Self> {
        match self {
            Self::LobPending(tag) => LobMaterialization::Owned(Self::LobOwned(LobHandle(*tag))),
            _ => LobMaterialization::Identity,
        }
    }
}

impl ScalarValue {
    const fn variant_rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) => 2,
            Self::Text(_) => 3,
            Self::LobPending(_) => 4,
            Self::LobOwned(_) => 5,
        }
    }
}

impl From<i64> for ScalarValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for ScalarValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

///
/// ColumnMeta
///
/// Immutable per-column metadata. `total_column_count` columns exist on
/// every row; only the first `visible_column_count` are surfaced to a
/// client cursor (see `row` module).
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ColumnMeta {
    pub alias: String,
    pub table_name: Option<String>,
    pub schema_name: Option<String>,
    pub column_name: String,
    pub sql_type: SqlType,
    pub precision: u32,
    pub scale: u32,
    pub display_size: u32,
    pub nullable: bool,
    pub auto_increment: bool,
}

impl ColumnMeta {
    /// A minimal column, useful for tests that don't care about full
    /// metadata fidelity.
    #[must_use]
    pub fn simple(alias: &str, sql_type: SqlType) -> Self {
        Self {
            alias: alias.to_string(),
            table_name: None,
            schema_name: None,
            column_name: alias.to_string(),
            sql_type,
            precision: 0,
            scale: 0,
            display_size: 0,
            nullable: true,
            auto_increment: false,
        }
    }
}
