//! Transfer Error Types
//!
//! Every error the gateway can return for a transfer or balance call.
//! Errors are `Clone` so a terminal failure can be cached and replayed to
//! duplicate callers.

use thiserror::Error;

use crate::bank::BankError;
use crate::protocol::error_codes;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    // === Validation Errors ===
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Sender and recipient account cannot be the same")]
    SameAccount,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // === Identity Errors ===
    #[error("Missing authorization token")]
    MissingAuth,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Access denied for role {0:?}")]
    Forbidden(String),

    // === Business Rejections ===
    #[error("Unknown bank: {0}")]
    UnknownBank(String),

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Bank already registered: {0}")]
    BankAlreadyRegistered(String),

    #[error("Recipient balance would overflow")]
    BalanceOverflow,

    // === Contention ===
    #[error("Participant busy, retry later")]
    ParticipantBusy,

    #[error("Transaction in progress")]
    DuplicateInFlight,

    // === Ambiguous ===
    #[error("Request timed out")]
    Timeout,

    // === Faults ===
    #[error("Participant unreachable: {0}")]
    ParticipantUnreachable(String),

    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Commit incomplete: {0}")]
    CommitIncomplete(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TransferError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidAmount => "INVALID_AMOUNT",
            TransferError::SameAccount => "SAME_ACCOUNT",
            TransferError::InvalidRequest(_) => "INVALID_PARAMETER",
            TransferError::MissingAuth => "MISSING_AUTH",
            TransferError::InvalidToken => "INVALID_TOKEN",
            TransferError::UnknownUser(_) => "UNKNOWN_USER",
            TransferError::Forbidden(_) => "FORBIDDEN",
            TransferError::UnknownBank(_) => "UNKNOWN_BANK",
            TransferError::UnknownAccount(_) => "UNKNOWN_ACCOUNT",
            TransferError::InsufficientBalance => "INSUFFICIENT_BALANCE",
            TransferError::BankAlreadyRegistered(_) => "BANK_ALREADY_REGISTERED",
            TransferError::BalanceOverflow => "BALANCE_OVERFLOW",
            TransferError::ParticipantBusy => "PARTICIPANT_BUSY",
            TransferError::DuplicateInFlight => "DUPLICATE_IN_FLIGHT",
            TransferError::Timeout => "TIMEOUT",
            TransferError::ParticipantUnreachable(_) => "PARTICIPANT_UNREACHABLE",
            TransferError::InvariantViolation(_) => "INTERNAL_INVARIANT",
            TransferError::CommitIncomplete(_) => "COMMIT_INCOMPLETE",
            TransferError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Numeric code carried in the response envelope
    pub fn api_code(&self) -> i32 {
        match self {
            TransferError::InvalidAmount => error_codes::INVALID_AMOUNT,
            TransferError::SameAccount => error_codes::SAME_ACCOUNT,
            TransferError::InvalidRequest(_) => error_codes::INVALID_PARAMETER,
            TransferError::MissingAuth => error_codes::MISSING_AUTH,
            TransferError::InvalidToken => error_codes::INVALID_TOKEN,
            TransferError::UnknownUser(_) => error_codes::UNKNOWN_USER,
            TransferError::Forbidden(_) => error_codes::FORBIDDEN,
            TransferError::UnknownBank(_) => error_codes::UNKNOWN_BANK,
            TransferError::UnknownAccount(_) => error_codes::UNKNOWN_ACCOUNT,
            TransferError::InsufficientBalance => error_codes::INSUFFICIENT_BALANCE,
            TransferError::BankAlreadyRegistered(_) => error_codes::BANK_ALREADY_REGISTERED,
            TransferError::BalanceOverflow => error_codes::BALANCE_OVERFLOW,
            TransferError::ParticipantBusy => error_codes::PARTICIPANT_BUSY,
            TransferError::DuplicateInFlight => error_codes::DUPLICATE_IN_FLIGHT,
            TransferError::Timeout => error_codes::TIMEOUT,
            TransferError::ParticipantUnreachable(_) => error_codes::PARTICIPANT_UNREACHABLE,
            TransferError::InvariantViolation(_) => error_codes::INTERNAL_INVARIANT,
            TransferError::CommitIncomplete(_) => error_codes::COMMIT_INCOMPLETE,
            TransferError::Internal(_) => error_codes::INTERNAL_ERROR,
        }
    }

    /// Message carried in the envelope; `from_api` turns it back into the payload.
    pub fn detail(&self) -> String {
        match self {
            TransferError::InvalidRequest(m)
            | TransferError::UnknownUser(m)
            | TransferError::Forbidden(m)
            | TransferError::UnknownBank(m)
            | TransferError::UnknownAccount(m)
            | TransferError::BankAlreadyRegistered(m)
            | TransferError::ParticipantUnreachable(m)
            | TransferError::InvariantViolation(m)
            | TransferError::CommitIncomplete(m)
            | TransferError::Internal(m) => m.clone(),
            _ => self.to_string(),
        }
    }

    /// Rebuild the error from a decoded envelope. Unknown codes become
    /// [`TransferError::Internal`].
    pub fn from_api(code: i32, msg: &str) -> Self {
        let msg = msg.to_string();
        match code {
            error_codes::INVALID_AMOUNT => TransferError::InvalidAmount,
            error_codes::SAME_ACCOUNT => TransferError::SameAccount,
            error_codes::INVALID_PARAMETER => TransferError::InvalidRequest(msg),
            error_codes::MISSING_AUTH => TransferError::MissingAuth,
            error_codes::INVALID_TOKEN => TransferError::InvalidToken,
            error_codes::UNKNOWN_USER => TransferError::UnknownUser(msg),
            error_codes::FORBIDDEN => TransferError::Forbidden(msg),
            error_codes::UNKNOWN_BANK => TransferError::UnknownBank(msg),
            error_codes::UNKNOWN_ACCOUNT => TransferError::UnknownAccount(msg),
            error_codes::INSUFFICIENT_BALANCE => TransferError::InsufficientBalance,
            error_codes::BANK_ALREADY_REGISTERED => TransferError::BankAlreadyRegistered(msg),
            error_codes::BALANCE_OVERFLOW => TransferError::BalanceOverflow,
            error_codes::PARTICIPANT_BUSY => TransferError::ParticipantBusy,
            error_codes::DUPLICATE_IN_FLIGHT => TransferError::DuplicateInFlight,
            error_codes::TIMEOUT => TransferError::Timeout,
            error_codes::PARTICIPANT_UNREACHABLE => TransferError::ParticipantUnreachable(msg),
            error_codes::INTERNAL_INVARIANT => TransferError::InvariantViolation(msg),
            error_codes::COMMIT_INCOMPLETE => TransferError::CommitIncomplete(msg),
            _ => TransferError::Internal(msg),
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::InvalidAmount
            | TransferError::SameAccount
            | TransferError::InvalidRequest(_) => 400,
            TransferError::MissingAuth | TransferError::InvalidToken => 401,
            TransferError::Forbidden(_) => 403,
            TransferError::UnknownUser(_)
            | TransferError::UnknownBank(_)
            | TransferError::UnknownAccount(_) => 404,
            TransferError::BankAlreadyRegistered(_)
            | TransferError::ParticipantBusy
            | TransferError::DuplicateInFlight => 409,
            TransferError::InsufficientBalance | TransferError::BalanceOverflow => 422,
            TransferError::Timeout => 504,
            TransferError::ParticipantUnreachable(_) => 502,
            TransferError::InvariantViolation(_)
            | TransferError::CommitIncomplete(_)
            | TransferError::Internal(_) => 500,
        }
    }

    /// Contention or an unknown outcome: the same `tx_id` may be tried again.
    ///
    /// Validation errors, business rejections and faults are final.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransferError::ParticipantBusy
                | TransferError::DuplicateInFlight
                | TransferError::Timeout
                | TransferError::ParticipantUnreachable(_)
        )
    }
}

impl From<BankError> for TransferError {
    fn from(e: BankError) -> Self {
        match e {
            BankError::UnknownAccount(account) => TransferError::UnknownAccount(account),
            BankError::InsufficientBalance => TransferError::InsufficientBalance,
            BankError::ParticipantBusy => TransferError::ParticipantBusy,
            BankError::BalanceOverflow => TransferError::BalanceOverflow,
            BankError::InvalidRequest(m) => TransferError::InvalidRequest(m),
            BankError::InvariantViolation(m) => TransferError::InvariantViolation(m),
        }
    }
}
