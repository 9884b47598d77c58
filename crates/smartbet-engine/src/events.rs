//! Append-only event log.
//!
//! Every committed state transition pushes one [`EventRecord`] and logs it.
//! Sequence numbers start at 0 and have no gaps.

use smartbet_types::{Event, EventRecord, Timestamp};

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: Event, at: Timestamp) {
        let seq = self.records.len() as u64;
        tracing::info!(seq, event = %event, detail = ?event, "Event emitted");
        self.records.push(EventRecord { seq, at, event });
    }

    #[must_use]
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records with `seq >= from`.
    #[must_use]
    pub fn since(&self, from: u64) -> &[EventRecord] {
        let start = usize::try_from(from).unwrap_or(usize::MAX).min(self.records.len());
        &self.records[start..]
    }
}
