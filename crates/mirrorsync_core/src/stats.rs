//! Counters kept by a sync context.

/// Traffic counters of one [`SyncContext`](crate::SyncContext).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Sender ticks that produced a message (`flush` calls with changes).
    pub ticks: u64,
    /// Messages encoded.
    pub messages_written: u64,
    /// Messages applied.
    pub messages_applied: u64,
    /// Encoded bytes produced.
    pub bytes_written: u64,
    /// Encoded bytes applied.
    pub bytes_applied: u64,
    /// Root entries written across all messages.
    pub roots_written: u64,
    /// Root entries applied across all messages.
    pub roots_applied: u64,
    /// Root entries skipped because no such root is registered.
    pub unknown_roots_skipped: u64,
}

impl SyncStats {
    pub(crate) fn record_write(&mut self, bytes: usize, roots: usize) {
        self.messages_written += 1;
        self.bytes_written += bytes as u64;
        self.roots_written += roots as u64;
    }

    pub(crate) fn record_apply(&mut self, bytes: usize, report: &UpdateReport) {
        self.messages_applied += 1;
        self.bytes_applied += bytes as u64;
        self.roots_applied += report.applied as u64;
        self.unknown_roots_skipped += report.skipped.len() as u64;
    }
}

/// What one [`SyncContext::update`](crate::SyncContext::update) did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Number of roots the message was applied to.
    pub applied: usize,
    /// Root names in the message that are not registered here.
    pub skipped: Vec<String>,
}

impl UpdateReport {
    /// True when every root in the message was known.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}
