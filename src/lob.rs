//! Module: lob
//! Responsibility: the session-owned temporary-LOB list that keeps
//! materialized large-object handles alive for exactly the session's
//! lifetime.
//! Does not own: the buffer — the buffer never owns LOB bytes, only a
//! handle; ownership lives here, the session-level collaborator.
//! Boundary: a small append-only registry; release happens on session
//! teardown, which this crate does not model (external collaborator).

use crate::value::Value;

///
/// TemporaryLobList
///
/// Reference implementation of the session-owned temp-LOB registry the
/// `Session` trait exposes through `add_temporary_lob`. Production sessions
/// back this with whatever storage actually holds LOB bytes; this type is
/// only a record of *which* handles are alive.
///

#[derive(Debug, Default)]
pub struct TemporaryLobList<V: Value> {
    handles: Vec<V>,
}

impl<V: Value> TemporaryLobList<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
        }
    }

    pub fn push(&mut self, value: V) {
        self.handles.push(value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    #[must_use]
    pub fn handles(&self) -> &[V] {
        &self.handles
    }
}
