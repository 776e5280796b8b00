//! Module: obs
//! Responsibility: observability boundary for the buffer.
//! Core buffer logic MUST NOT depend on any concrete sink. All
//! instrumentation flows through `BufferEvent` and `MetricsSink`.
//! Does not own: metrics aggregation, export, or storage — a caller-supplied
//! sink owns that.
//! Boundary: this module is the only allowed bridge between buffer logic and
//! whatever telemetry system the embedding engine runs.

use crate::hash::StableHash;

///
/// BufferEvent
///
/// One observable state transition of a `ResultBuffer`. Emitted best-effort;
/// a missing sink means events are simply not produced, never buffered.
///

#[derive(Clone, Copy, Debug)]
pub enum BufferEvent {
    RowAdded { row_count: u64 },
    RowDeduped { key_hash: StableHash },
    SpillPromoted { rows_transferred: u64 },
    ResidualFlushed { rows_flushed: u64 },
    WindowApplied { kept: u64, dropped: u64 },
    ShallowCopyGranted,
    ShallowCopyRefused,
    Closed,
}

///
/// MetricsSink
///
/// Receiver for `BufferEvent`s. Implementors typically forward into a
/// counters/histogram backend; the default is to do nothing.
///

pub trait MetricsSink {
    fn record(&self, event: BufferEvent);
}

/// A sink that discards every event. The implicit default when a
/// `ResultBuffer` is built without `.metrics_sink(..)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl MetricsSink for NullSink {
    fn record(&self, _event: BufferEvent) {}
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::{BufferEvent, MetricsSink};
    use std::cell::RefCell;

    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) events: RefCell<Vec<BufferEvent>>,
    }

    impl MetricsSink for RecordingSink {
        fn record(&self, event: BufferEvent) {
            self.events.borrow_mut().push(event);
        }
    }
}
