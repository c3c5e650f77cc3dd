//! Bank server (participant) error types.

use thiserror::Error;

use crate::protocol::error_codes;

/// Errors a participant returns to the coordinator.
///
/// Business rejections are never retried locally. `InvariantViolation` means
/// the coordinator called commit out of protocol order; it is a fault of the
/// orchestrator, not of the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BankError {
    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Insufficient balance to complete transaction")]
    InsufficientBalance,

    #[error("Account is locked by another transaction (participant busy)")]
    ParticipantBusy,

    #[error("Balance would overflow")]
    BalanceOverflow,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),
}

impl BankError {
    /// Stable error name for logs and API responses
    pub fn code(&self) -> &'static str {
        match self {
            BankError::UnknownAccount(_) => "UNKNOWN_ACCOUNT",
            BankError::InsufficientBalance => "INSUFFICIENT_BALANCE",
            BankError::ParticipantBusy => "PARTICIPANT_BUSY",
            BankError::BalanceOverflow => "BALANCE_OVERFLOW",
            BankError::InvalidRequest(_) => "INVALID_REQUEST",
            BankError::InvariantViolation(_) => "INTERNAL_INVARIANT",
        }
    }

    /// Numeric code carried in the response envelope
    pub fn api_code(&self) -> i32 {
        match self {
            BankError::UnknownAccount(_) => error_codes::UNKNOWN_ACCOUNT,
            BankError::InsufficientBalance => error_codes::INSUFFICIENT_BALANCE,
            BankError::ParticipantBusy => error_codes::PARTICIPANT_BUSY,
            BankError::BalanceOverflow => error_codes::BALANCE_OVERFLOW,
            BankError::InvalidRequest(_) => error_codes::INVALID_PARAMETER,
            BankError::InvariantViolation(_) => error_codes::INTERNAL_INVARIANT,
        }
    }

    /// Message carried in the envelope; `from_api` turns it back into the payload.
    pub fn detail(&self) -> String {
        match self {
            BankError::UnknownAccount(m)
            | BankError::InvalidRequest(m)
            | BankError::InvariantViolation(m) => m.clone(),
            _ => self.to_string(),
        }
    }

    /// Rebuild the error from an envelope received over the wire.
    ///
    /// Returns `None` for codes a participant never emits.
    pub fn from_api(code: i32, msg: &str) -> Option<Self> {
        let err = match code {
            error_codes::UNKNOWN_ACCOUNT => BankError::UnknownAccount(msg.to_string()),
            error_codes::INSUFFICIENT_BALANCE => BankError::InsufficientBalance,
            error_codes::PARTICIPANT_BUSY => BankError::ParticipantBusy,
            error_codes::BALANCE_OVERFLOW => BankError::BalanceOverflow,
            error_codes::INVALID_PARAMETER => BankError::InvalidRequest(msg.to_string()),
            error_codes::INTERNAL_INVARIANT => BankError::InvariantViolation(msg.to_string()),
            _ => return None,
        };
        Some(err)
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            BankError::UnknownAccount(_) => 404,
            BankError::InsufficientBalance | BankError::BalanceOverflow => 422,
            BankError::ParticipantBusy => 409,
            BankError::InvalidRequest(_) => 400,
            BankError::InvariantViolation(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_code_round_trip() {
        let errors = [
            BankError::UnknownAccount("X9".into()),
            BankError::InsufficientBalance,
            BankError::ParticipantBusy,
            BankError::BalanceOverflow,
            BankError::InvalidRequest("zero amount".into()),
            BankError::InvariantViolation("not locked".into()),
        ];
        for err in errors {
            assert_eq!(BankError::from_api(err.api_code(), &err.detail()), Some(err));
        }
        assert_eq!(BankError::from_api(error_codes::TIMEOUT, "x"), None);
    }

    #[test]
    fn test_http_status() {
        assert_eq!(BankError::ParticipantBusy.http_status(), 409);
        assert_eq!(BankError::InsufficientBalance.http_status(), 422);
        assert_eq!(BankError::InvariantViolation("x".into()).http_status(), 500);
    }
}
