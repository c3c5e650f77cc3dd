//! Transaction status as seen by the coordinator.

use std::fmt;

/// Status of a transaction id in the idempotency cache.
///
/// A transaction id with no cache record is absent (never seen, or retryable
/// after a transient prepare failure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferStatus {
    /// Two-phase sequence running; duplicates are rejected
    InProgress,

    /// Terminal: both legs committed
    Succeeded,

    /// Terminal: the cached failure is replayed to duplicates
    Failed,
}

impl TransferStatus {
    /// Check if this is a terminal state (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Succeeded | TransferStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::InProgress => "IN_PROGRESS",
            TransferStatus::Succeeded => "SUCCEEDED",
            TransferStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(TransferStatus::Succeeded.is_terminal());
        assert!(TransferStatus::Failed.is_terminal());
        assert!(!TransferStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(TransferStatus::InProgress.to_string(), "IN_PROGRESS");
        assert_eq!(TransferStatus::Succeeded.to_string(), "SUCCEEDED");
    }
}
