use thiserror::Error;

use crate::transfer::TransferError;

/// What the caller sees when a request does not complete.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Terminal answer from the gateway. Retrying will not change it.
    #[error("{0}")]
    Rejected(TransferError),

    /// Every attempt timed out or hit contention. The outcome of a payment
    /// is unknown; resend with the same `tx_id` to learn it.
    #[error("request timed out after {attempts} attempts (last error: {last})")]
    TimedOut { attempts: u32, last: TransferError },
}

impl ClientError {
    pub fn code(&self) -> &'static str {
        match self {
            ClientError::Rejected(e) => e.code(),
            ClientError::TimedOut { .. } => "TIMED_OUT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ClientError::TimedOut {
            attempts: 5,
            last: TransferError::Timeout,
        };
        assert!(err.to_string().starts_with("request timed out after 5 attempts"));
        assert_eq!(err.code(), "TIMED_OUT");
        assert_eq!(
            ClientError::Rejected(TransferError::InsufficientBalance).code(),
            TransferError::InsufficientBalance.code()
        );
    }
}
