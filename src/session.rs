//! Module: session
//! Responsibility: the `Session` external-collaborator trait the buffer
//! calls for memory policy and LOB registration, plus a reference
//! implementation used by this crate's own tests.
//! Does not own: transaction isolation, connection lifecycle, or anything
//! else a real session does — only the handful of capabilities `spec.md` §6
//! names as required.
//! Boundary: `ResultBuffer<V>` holds a `&mut dyn Session<V>` (or owns a
//! concrete `S: Session<V>`) for its construction; it never downcasts.

use crate::lob::TemporaryLobList;
use crate::value::Value;

///
/// Session
///
/// External collaborator the buffer requires: memory policy and temporary
/// LOB registration. Everything else (transactions, the network layer,
/// other tables) is out of scope per `spec.md` §1.
///

pub trait Session<V: Value> {
    /// Register a materialized LOB replacement so it outlives the buffer.
    fn add_temporary_lob(&mut self, value: V);

    /// Explicit spill threshold configured on the session/database, if any.
    /// `None` means the session has no configured bound (distinct from the
    /// buffer's own "unbounded" default for transient sessions).
    fn max_memory_rows(&self) -> Option<usize>;

    fn is_persistent(&self) -> bool;
    fn is_read_only(&self) -> bool;
    fn is_mv_store(&self) -> bool;
}

/// The buffer's default spill threshold absent an explicit
/// `set-max-memory-rows` call: unbounded for a transient (read-only or
/// in-memory) session, otherwise whatever the session configures.
#[must_use]
pub fn default_max_memory_rows<V: Value>(session: &dyn Session<V>) -> Option<usize> {
    if !session.is_persistent() || session.is_read_only() {
        None
    } else {
        session.max_memory_rows()
    }
}

///
/// TestSession
///
/// Minimal in-process `Session` used by this crate's own tests and
/// available to embedders who don't yet have a real session type to plug
/// in.
///

#[derive(Debug)]
pub struct TestSession<V: Value> {
    lobs: TemporaryLobList<V>,
    max_memory_rows: Option<usize>,
    persistent: bool,
    read_only: bool,
    mv_store: bool,
}

impl<V: Value> TestSession<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lobs: TemporaryLobList::new(),
            max_memory_rows: None,
            persistent: true,
            read_only: false,
            mv_store: true,
        }
    }

    #[must_use]
    pub const fn with_max_memory_rows(mut self, n: usize) -> Self {
        self.max_memory_rows = Some(n);
        self
    }

    #[must_use]
    pub const fn transient(mut self) -> Self {
        self.persistent = false;
        self
    }

    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    #[must_use]
    pub fn temporary_lobs(&self) -> &TemporaryLobList<V> {
        &self.lobs
    }
}

impl<V: Value> Default for TestSession<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Value> Session<V> for TestSession<V> {
    fn add_temporary_lob(&mut self, value: V) {
        self.lobs.push(value);
    }

    fn max_memory_rows(&self) -> Option<usize> {
        self.max_memory_rows
    }

    fn is_persistent(&self) -> bool {
        self.persistent
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn is_mv_store(&self) -> bool {
        self.mv_store
    }
}
