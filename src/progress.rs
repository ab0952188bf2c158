//! Phase-tagged progress reporting
//!
//! The sink is an explicit dependency passed into the export call, never a
//! module-level emitter, so multiple concurrent exports (including tests)
//! never cross-talk. Events are emitted synchronously and unbuffered as work
//! actually progresses.

use serde::Serialize;

/// A phase-tagged progress event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum ProgressEvent {
    /// Asset listing and deduplication in progress
    Prepare,
    /// Download counters, fired after every completed fetch unit
    Download {
        /// Units completed so far (success or recorded failure)
        completed: usize,
        /// Total fetch units in this export
        total: usize,
    },
    /// Archive compression progress
    Zip {
        /// Percent of archive entries written, 0-100
        percent: u8,
    },
    /// Export finished
    Done,
}

/// Injected callback consuming progress events
pub type ProgressSink = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// A sink that discards every event, for callers that do not track progress
pub fn noop_sink() -> ProgressSink {
    Box::new(|_| {})
}
