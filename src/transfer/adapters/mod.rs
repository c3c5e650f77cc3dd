//! Participant Adapters
//!
//! The coordinator reaches bank servers only through [`Participant`]. Two
//! adapters exist: [`HttpParticipant`] for bank servers on the network and
//! [`LocalParticipant`] for a `BankService` in the same process.
//!
//! Adapters do not apply timeouts; the coordinator bounds every call.

pub mod http;
pub mod local;

pub use http::{HttpConnector, HttpParticipant};
pub use local::{LocalConnector, LocalParticipant};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::error::TransferError;
use crate::bank::BankError;
use crate::core_types::{AccountId, BankName};
use crate::money::Amount;
use crate::protocol::{LegRequest, ReleaseRequest};

/// Failure of a single participant call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LegError {
    /// The participant answered and said no
    #[error(transparent)]
    Rejected(#[from] BankError),

    /// No usable answer (connection refused, malformed response, ...)
    #[error("unreachable: {0}")]
    Unreachable(String),
}

/// One bank server, as seen by the coordinator.
#[async_trait]
pub trait Participant: Send + Sync {
    fn name(&self) -> &BankName;

    /// Validate and lock the leg's account.
    async fn prepare(&self, leg: &LegRequest) -> Result<(), LegError>;

    /// Apply a prepared leg. Repeating it is acknowledged without effect.
    async fn commit(&self, leg: &LegRequest) -> Result<(), LegError>;

    /// Unwind a prepared leg; scoped to `tx_id`.
    async fn release(&self, req: &ReleaseRequest) -> Result<(), LegError>;

    async fn balance(&self, account: &AccountId) -> Result<Amount, LegError>;
}

/// Builds a participant from a registration (`name`, `address`).
pub trait ParticipantConnector: Send + Sync {
    fn connect(&self, name: &BankName, address: &str)
    -> Result<Arc<dyn Participant>, TransferError>;
}
