//! Transaction Idempotency Cache
//!
//! Keyed by caller-supplied `tx_id`, sharded through `DashMap`. The record is
//! claimed (`InProgress`) before any remote call, so at most one two-phase
//! sequence runs per `tx_id`. Terminal records are replayed to duplicates
//! until retention expires them.

use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::state::TransferStatus;
use super::types::{TransactionRecord, TransferOutcome, TransferRequest};
use crate::core_types::TxId;

/// Result of claiming a `tx_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// First sighting: the caller now owns the two-phase sequence
    Fresh,
    /// Another call for this `tx_id` is running
    InFlight,
    /// Terminal outcome to replay
    Settled(TransferOutcome),
}

#[derive(Debug, Default)]
pub struct TransactionCache {
    records: DashMap<TxId, TransactionRecord>,
}

impl TransactionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, request: &TransferRequest) -> Claim {
        match self.records.entry(request.tx_id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(TransactionRecord::in_progress(request.clone()));
                Claim::Fresh
            }
            Entry::Occupied(existing) => {
                let record = existing.get();
                if &record.request != request {
                    warn!(
                        tx_id = %request.tx_id,
                        "tx_id reused with different parameters, answering from the original"
                    );
                }
                match &record.outcome {
                    Some(outcome) => Claim::Settled(outcome.clone()),
                    None => Claim::InFlight,
                }
            }
        }
    }

    /// Record the terminal outcome. A record that is already terminal is
    /// never overwritten.
    pub fn finish(&self, tx_id: &TxId, outcome: TransferOutcome) {
        let Some(mut record) = self.records.get_mut(tx_id) else {
            warn!(tx_id = %tx_id, "Finishing a transaction with no cache record");
            return;
        };
        if record.status.is_terminal() {
            warn!(tx_id = %tx_id, status = %record.status, "Transaction already terminal");
            return;
        }
        record.status = match outcome {
            Ok(_) => TransferStatus::Succeeded,
            Err(_) => TransferStatus::Failed,
        };
        record.outcome = Some(outcome);
        record.settled_at = Some(Instant::now());
    }

    /// Drop an in-progress record so the same `tx_id` can run again.
    /// Terminal records are kept.
    pub fn forget(&self, tx_id: &TxId) -> bool {
        self.records
            .remove_if(tx_id, |_, r| !r.status.is_terminal())
            .is_some()
    }

    /// Evict terminal records settled more than `retention` ago.
    pub fn sweep_expired(&self, retention: Duration) -> usize {
        let now = Instant::now();
        let before = self.records.len();
        self.records.retain(|_, r| match r.settled_at {
            Some(at) => now.duration_since(at) < retention,
            None => true,
        });
        let evicted = before.saturating_sub(self.records.len());
        if evicted > 0 {
            debug!(evicted, "Expired transaction records evicted");
        }
        evicted
    }

    pub fn status(&self, tx_id: &TxId) -> Option<TransferStatus> {
        self.records.get(tx_id).map(|r| r.status)
    }

    pub fn get(&self, tx_id: &TxId) -> Option<TransactionRecord> {
        self.records.get(tx_id).map(|r| r.clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{AccountId, BankName};
    use crate::money::Amount;
    use crate::transfer::error::TransferError;
    use crate::transfer::types::{Party, TransferReceipt};

    fn request(tx: &str) -> TransferRequest {
        TransferRequest {
            tx_id: TxId::new(tx),
            sender: Party::new(BankName::from_index(1), AccountId::new("A1")),
            recipient: Party::new(BankName::from_index(2), AccountId::new("B1")),
            amount: Amount::from_major(50),
        }
    }

    #[test]
    fn test_claim_lifecycle() {
        let cache = TransactionCache::new();
        let req = request("t1");

        assert_eq!(cache.begin(&req), Claim::Fresh);
        assert_eq!(cache.status(&req.tx_id), Some(TransferStatus::InProgress));
        assert_eq!(cache.begin(&req), Claim::InFlight);

        let receipt = TransferReceipt::succeeded(&req);
        cache.finish(&req.tx_id, Ok(receipt.clone()));
        assert_eq!(cache.begin(&req), Claim::Settled(Ok(receipt)));
    }

    #[test]
    fn test_terminal_state_never_changes() {
        let cache = TransactionCache::new();
        let req = request("t1");
        cache.begin(&req);
        cache.finish(&req.tx_id, Err(TransferError::InsufficientBalance));
        cache.finish(&req.tx_id, Ok(TransferReceipt::succeeded(&req)));

        assert_eq!(cache.status(&req.tx_id), Some(TransferStatus::Failed));
        assert!(!cache.forget(&req.tx_id));
        assert_eq!(
            cache.begin(&req),
            Claim::Settled(Err(TransferError::InsufficientBalance))
        );
    }

    #[test]
    fn test_forget_in_progress() {
        let cache = TransactionCache::new();
        let req = request("t1");
        cache.begin(&req);
        assert!(cache.forget(&req.tx_id));
        assert_eq!(cache.begin(&req), Claim::Fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_only_expired_terminal_records() {
        let cache = TransactionCache::new();
        let done = request("done");
        let running = request("running");
        cache.begin(&done);
        cache.begin(&running);
        cache.finish(&done.tx_id, Ok(TransferReceipt::succeeded(&done)));

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(cache.sweep_expired(Duration::from_secs(60)), 0);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(cache.sweep_expired(Duration::from_secs(60)), 1);
        assert!(cache.get(&done.tx_id).is_none());
        assert_eq!(cache.status(&running.tx_id), Some(TransferStatus::InProgress));
    }
}
