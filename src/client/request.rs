//! Requests the client can send and the answers it gets back.

use std::fmt;

use crate::core_types::TxId;
use crate::protocol::{BalanceData, TransferApiRequest, TransferApiResponse};

/// A request captured with everything needed to replay it later.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClientRequest {
    Balance,
    Pay(TransferApiRequest),
}

/// Logical identity of a request, used to keep the offline queue free of
/// duplicates. Payments are identified by their `tx_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestKey {
    Balance,
    Pay(TxId),
}

impl ClientRequest {
    pub fn key(&self) -> RequestKey {
        match self {
            ClientRequest::Balance => RequestKey::Balance,
            ClientRequest::Pay(req) => RequestKey::Pay(req.tx_id.clone()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClientRequest::Balance => "balance",
            ClientRequest::Pay(_) => "pay",
        }
    }
}

impl fmt::Display for ClientRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientRequest::Balance => write!(f, "balance"),
            ClientRequest::Pay(req) => write!(
                f,
                "pay {} to {}/{} (tx {})",
                req.amount, req.recipient_bank, req.recipient_account, req.tx_id
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientResponse {
    Balance(BalanceData),
    Paid(TransferApiResponse),
}

impl fmt::Display for ClientResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientResponse::Balance(data) => {
                write!(f, "balance of {}: {}", data.account, data.balance)
            }
            ClientResponse::Paid(resp) => write!(f, "{} ({})", resp.message, resp.status),
        }
    }
}
