//! Configuration for sync contexts.

/// Default upper bound for one encoded message (16 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Configuration for a [`SyncContext`](crate::SyncContext).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextConfig {
    /// Name attached to this context's log events, e.g. `"server"`.
    pub label: String,
    /// Skip roots named in an update but not registered here, instead of
    /// failing with [`MirrorError::UnknownRoot`](crate::MirrorError::UnknownRoot).
    pub ignore_unknown_roots: bool,
    /// Largest encoded message accepted by `encode` and `apply`.
    pub max_message_size: usize,
}

impl ContextConfig {
    /// Creates a configuration with default settings.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ignore_unknown_roots: true,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    /// Sets whether unknown roots are skipped.
    #[must_use]
    pub fn with_ignore_unknown_roots(mut self, ignore: bool) -> Self {
        self.ignore_unknown_roots = ignore;
        self
    }

    /// Sets the message size limit.
    #[must_use]
    pub fn with_max_message_size(mut self, bytes: usize) -> Self {
        self.max_message_size = bytes;
        self
    }

    /// Rejects unknown roots.
    #[must_use]
    pub fn strict(self) -> Self {
        self.with_ignore_unknown_roots(false)
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self::new("context")
    }
}
