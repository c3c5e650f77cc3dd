//! Wire types shared by the gateway, the bank servers and their clients.
//!
//! - `ApiResponse<T>`: unified response envelope
//! - `error_codes`: numeric error codes carried in the envelope
//! - request / response DTOs for every remote operation

use serde::{Deserialize, Serialize};

use crate::core_types::{AccountId, BankName, LegKind, TxId};
use crate::money::Amount;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or absent (error)
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }

    /// Split a decoded envelope into its payload or `(code, msg)`.
    pub fn into_result(self) -> Result<T, (i32, String)> {
        match (self.code, self.data) {
            (error_codes::SUCCESS, Some(data)) => Ok(data),
            (error_codes::SUCCESS, None) => Err((
                error_codes::INTERNAL_ERROR,
                "success response without data".to_string(),
            )),
            (code, _) => Err((code, self.msg)),
        }
    }
}

/// Standard API error codes
pub mod error_codes {
    pub const SUCCESS: i32 = 0;

    // Validation (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const INVALID_AMOUNT: i32 = 1002;
    pub const SAME_ACCOUNT: i32 = 1003;

    // Identity (2xxx)
    pub const MISSING_AUTH: i32 = 2001;
    pub const INVALID_TOKEN: i32 = 2002;
    pub const UNKNOWN_USER: i32 = 2003;
    pub const FORBIDDEN: i32 = 2004;

    // Business rejections (3xxx)
    pub const UNKNOWN_BANK: i32 = 3001;
    pub const UNKNOWN_ACCOUNT: i32 = 3002;
    pub const INSUFFICIENT_BALANCE: i32 = 3003;
    pub const BANK_ALREADY_REGISTERED: i32 = 3004;
    pub const BALANCE_OVERFLOW: i32 = 3005;

    // Contention / ambiguity (4xxx)
    pub const PARTICIPANT_BUSY: i32 = 4001;
    pub const DUPLICATE_IN_FLIGHT: i32 = 4002;
    pub const TIMEOUT: i32 = 4003;

    // Faults (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const PARTICIPANT_UNREACHABLE: i32 = 5001;
    pub const INTERNAL_INVARIANT: i32 = 5002;
    pub const COMMIT_INCOMPLETE: i32 = 5003;
}

// ============================================================================
// Participant (bank server) DTOs
// ============================================================================

/// Body of `Prepare` and `Commit`: one leg of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegRequest {
    pub kind: LegKind,
    pub account: AccountId,
    pub amount: Amount,
    pub tx_id: TxId,
}

/// Body of `Release`. The lock is only cleared if `tx_id` holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRequest {
    pub account: AccountId,
    pub tx_id: TxId,
}

/// Empty acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceData {
    pub account: AccountId,
    pub balance: Amount,
}

// ============================================================================
// Gateway DTOs
// ============================================================================

/// One-time registration of a bank server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterBankRequest {
    pub name: BankName,
    /// Base URL the gateway uses to reach the bank (e.g. `http://127.0.0.1:40001`).
    pub address: String,
}

/// Payment from the caller's own account (resolved from the bearer token).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferApiRequest {
    pub recipient_bank: BankName,
    pub recipient_account: AccountId,
    pub amount: Amount,
    pub tx_id: TxId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferApiResponse {
    pub tx_id: TxId,
    pub status: String,
    pub message: String,
}
