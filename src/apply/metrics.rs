//! Apply Metrics
//!
//! Usage counters accumulated while applying commands to a cell. They are
//! computed only from argument sizes and the engine's integer outcome, never by
//! re-reading engine state, so every replica arrives at the same numbers.

use std::fmt;

/// Counters produced by applying one command, or folded over a whole batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyMetrics {
    /// New logical keys created
    pub written_keys: u64,
    /// Payload bytes persisted
    pub written_bytes: u64,
    /// Signed estimate of the change in stored bytes
    pub size_diff_hint: i64,
    /// Keys that may have become empty
    pub delete_keys_hint: u64,
}

impl ApplyMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits `bytes` of newly persisted payload.
    pub fn record_write(&mut self, bytes: u64) {
        self.written_bytes = self.written_bytes.saturating_add(bytes);
        self.grow(bytes);
    }

    /// Credits a newly created key whose name is `key_len` bytes long.
    pub fn record_new_key(&mut self, key_len: u64) {
        self.written_keys = self.written_keys.saturating_add(1);
        self.record_write(key_len);
    }

    pub fn grow(&mut self, bytes: u64) {
        self.size_diff_hint = self.size_diff_hint.saturating_add(to_signed(bytes));
    }

    pub fn shrink(&mut self, bytes: u64) {
        self.size_diff_hint = self.size_diff_hint.saturating_sub(to_signed(bytes));
    }

    pub fn hint_deleted_key(&mut self) {
        self.delete_keys_hint = self.delete_keys_hint.saturating_add(1);
    }

    /// Adds `other` into `self`.
    pub fn merge(&mut self, other: &ApplyMetrics) {
        self.written_keys = self.written_keys.saturating_add(other.written_keys);
        self.written_bytes = self.written_bytes.saturating_add(other.written_bytes);
        self.size_diff_hint = self.size_diff_hint.saturating_add(other.size_diff_hint);
        self.delete_keys_hint = self.delete_keys_hint.saturating_add(other.delete_keys_hint);
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    /// Returns the current totals and resets them.
    pub fn take(&mut self) -> ApplyMetrics {
        std::mem::take(self)
    }
}

impl fmt::Display for ApplyMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "keys={} bytes={} size_diff={} delete_hint={}",
            self.written_keys, self.written_bytes, self.size_diff_hint, self.delete_keys_hint
        )
    }
}

fn to_signed(bytes: u64) -> i64 {
    i64::try_from(bytes).unwrap_or(i64::MAX)
}

/// Sum of the lengths of `items`.
pub fn payload_len<'a>(items: impl IntoIterator<Item = &'a bytes::Bytes>) -> u64 {
    items.into_iter().map(|b| b.len() as u64).sum()
}
