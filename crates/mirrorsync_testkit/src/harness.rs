//! Loopback replication harness.
//!
//! Connects a sender and a receiver context directly, without a transport,
//! and checks that the receiver tracks the sender tick by tick.

use mirrorsync_core::{MirrorResult, SyncContext};

/// A sender and a receiver context joined back to back.
pub struct Loopback {
    /// The side that is mutated.
    pub sender: SyncContext,
    /// The side that only applies messages.
    pub receiver: SyncContext,
    ticks: usize,
    bytes_sent: usize,
}

impl Loopback {
    /// Joins two contexts and bootstraps the receiver from a full snapshot
    /// of the sender, then marks the sender clean.
    pub fn new(mut sender: SyncContext, mut receiver: SyncContext) -> MirrorResult<Self> {
        let snapshot = sender.snapshot()?;
        receiver.apply(&snapshot)?;
        sender.mark_clean();
        Ok(Self {
            sender,
            receiver,
            ticks: 0,
            bytes_sent: snapshot.len(),
        })
    }

    /// Runs one tick: flush the sender, apply on the receiver.
    ///
    /// Returns the size of the message sent, or `None` when the sender was
    /// clean.
    pub fn tick(&mut self) -> MirrorResult<Option<usize>> {
        let Some(bytes) = self.sender.flush()? else {
            return Ok(None);
        };
        self.receiver.apply(&bytes)?;
        self.ticks += 1;
        self.bytes_sent += bytes.len();
        Ok(Some(bytes.len()))
    }

    /// True when both sides encode to the same full snapshot.
    pub fn converged(&mut self) -> MirrorResult<bool> {
        Ok(self.sender.snapshot()? == self.receiver.snapshot()?)
    }

    /// Panics with both dumps when the sides differ.
    pub fn assert_converged(&mut self) {
        let converged = self.converged().expect("snapshots encode");
        assert!(
            converged,
            "replicas diverged after {} ticks\n--- sender ---\n{}\n--- receiver ---\n{}",
            self.ticks,
            self.sender.describe(),
            self.receiver.describe()
        );
    }

    /// Ticks that carried a message.
    pub fn ticks(&self) -> usize {
        self.ticks
    }

    /// Bytes sent so far, snapshot included.
    pub fn bytes_sent(&self) -> usize {
        self.bytes_sent
    }
}
