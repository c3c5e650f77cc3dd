//! Transfer Core Types

use std::fmt;

use tokio::time::Instant;

use super::error::TransferError;
use super::state::TransferStatus;
use crate::core_types::{AccountId, BankName, LegKind, TxId};
use crate::money::Amount;
use crate::protocol::{LegRequest, ReleaseRequest, TransferApiResponse};

/// One side of a transfer: an account at a bank.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Party {
    pub bank: BankName,
    pub account: AccountId,
}

impl Party {
    pub fn new(bank: BankName, account: AccountId) -> Self {
        Self { bank, account }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bank, self.account)
    }
}

/// A fully resolved transfer, after identity resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub tx_id: TxId,
    pub sender: Party,
    pub recipient: Party,
    pub amount: Amount,
}

impl TransferRequest {
    pub fn leg(&self, kind: LegKind) -> LegRequest {
        let party = match kind {
            LegKind::Debit => &self.sender,
            LegKind::Credit => &self.recipient,
        };
        LegRequest {
            kind,
            account: party.account.clone(),
            amount: self.amount,
            tx_id: self.tx_id.clone(),
        }
    }

    pub fn release(&self, kind: LegKind) -> ReleaseRequest {
        let leg = self.leg(kind);
        ReleaseRequest {
            account: leg.account,
            tx_id: leg.tx_id,
        }
    }
}

/// Successful outcome of a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub tx_id: TxId,
    pub status: TransferStatus,
    pub message: String,
}

impl TransferReceipt {
    pub fn succeeded(req: &TransferRequest) -> Self {
        Self {
            tx_id: req.tx_id.clone(),
            status: TransferStatus::Succeeded,
            message: format!(
                "Transferred {} from {} to {}",
                req.amount, req.sender, req.recipient
            ),
        }
    }
}

impl From<TransferReceipt> for TransferApiResponse {
    fn from(r: TransferReceipt) -> Self {
        TransferApiResponse {
            tx_id: r.tx_id,
            status: r.status.to_string(),
            message: r.message,
        }
    }
}

pub type TransferOutcome = Result<TransferReceipt, TransferError>;

/// Idempotency cache entry.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub request: TransferRequest,
    pub status: TransferStatus,
    /// Set once the record is terminal
    pub outcome: Option<TransferOutcome>,
    /// Wall clock, milliseconds since epoch
    pub created_at: i64,
    /// Monotonic settle time, drives retention
    pub settled_at: Option<Instant>,
}

impl TransactionRecord {
    pub fn in_progress(request: TransferRequest) -> Self {
        Self {
            request,
            status: TransferStatus::InProgress,
            outcome: None,
            created_at: chrono::Utc::now().timestamp_millis(),
            settled_at: None,
        }
    }
}
