//! Participant Transaction State Machine
//!
//! One `BankService` per bank server. It owns the [`AccountLedger`] and the
//! per-leg state table, and never talks to other participants.
//!
//! # Lock order
//! A leg entry may be held while an account guard is taken (commit), never
//! the other way around.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::error::BankError;
use super::state::LegState;
use crate::core_types::{AccountId, BankName, LegKind, TxId};
use crate::ledger::{AccountLedger, AcquireOutcome, ReleaseOutcome, Reservation};
use crate::money::Amount;
use crate::protocol::{LegRequest, ReleaseRequest};

#[derive(Debug, Clone)]
struct LegEntry {
    account: AccountId,
    state: LegState,
    /// Set on entering a terminal state, drives eviction
    settled_at: Option<Instant>,
}

impl LegEntry {
    fn settle(&mut self, state: LegState) {
        self.state = state;
        self.settled_at = Some(Instant::now());
    }
}

pub struct BankService {
    name: BankName,
    ledger: AccountLedger,
    legs: DashMap<(TxId, LegKind), LegEntry>,
}

impl BankService {
    pub fn new(name: BankName, ledger: AccountLedger) -> Self {
        Self {
            name,
            ledger,
            legs: DashMap::new(),
        }
    }

    pub fn name(&self) -> &BankName {
        &self.name
    }

    pub fn ledger(&self) -> &AccountLedger {
        &self.ledger
    }

    /// State of a leg, `None` while idle.
    pub fn leg_state(&self, tx_id: &TxId, kind: LegKind) -> Option<LegState> {
        self.legs.get(&(tx_id.clone(), kind)).map(|e| e.state)
    }

    fn validate(req: &LegRequest) -> Result<(), BankError> {
        if req.tx_id.is_empty() {
            return Err(BankError::InvalidRequest("tx_id is required".into()));
        }
        if req.amount.is_zero() {
            return Err(BankError::InvalidRequest("amount must be positive".into()));
        }
        Ok(())
    }

    fn reservation(req: &LegRequest) -> Reservation {
        Reservation {
            tx_id: req.tx_id.clone(),
            kind: req.kind,
            amount: req.amount,
        }
    }

    /// Validate and lock the account for this leg.
    ///
    /// On any failure the account is left exactly as it was.
    pub async fn prepare(&self, req: &LegRequest) -> Result<(), BankError> {
        Self::validate(req)?;
        let key = (req.tx_id.clone(), req.kind);

        if let Some(entry) = self.legs.get(&key)
            && entry.state == LegState::Committed
        {
            debug!(tx_id = %req.tx_id, kind = %req.kind, "Prepare after commit, acknowledging");
            return Ok(());
        }

        let outcome = self
            .ledger
            .acquire(&req.account, &Self::reservation(req))
            .await
            .inspect_err(|e| {
                info!(
                    bank = %self.name,
                    tx_id = %req.tx_id,
                    kind = %req.kind,
                    account = %req.account,
                    error = %e,
                    "Prepare rejected"
                )
            })?;

        self.legs.insert(
            key,
            LegEntry {
                account: req.account.clone(),
                state: LegState::Prepared,
                settled_at: None,
            },
        );

        match outcome {
            AcquireOutcome::Acquired => info!(
                bank = %self.name,
                tx_id = %req.tx_id,
                kind = %req.kind,
                account = %req.account,
                amount = %req.amount,
                "Leg prepared"
            ),
            AcquireOutcome::AlreadyHeld => {
                debug!(tx_id = %req.tx_id, kind = %req.kind, "Duplicate prepare")
            }
        }
        Ok(())
    }

    /// Apply a prepared leg and release its lock.
    ///
    /// Anything other than a matching prepared leg is an
    /// [`BankError::InvariantViolation`]: the coordinator called commit out
    /// of protocol order.
    pub fn commit(&self, req: &LegRequest) -> Result<Amount, BankError> {
        Self::validate(req)?;
        let key = (req.tx_id.clone(), req.kind);

        let Some(mut entry) = self.legs.get_mut(&key) else {
            return Err(self.violation(req, "commit without prepare".into()));
        };

        match entry.state {
            LegState::Committed => {
                debug!(tx_id = %req.tx_id, kind = %req.kind, "Duplicate commit");
                return self.ledger.balance(&req.account);
            }
            LegState::Released => {
                return Err(self.violation(req, "commit after release".into()));
            }
            LegState::Prepared => {}
        }

        if entry.account != req.account {
            let detail = format!("prepared on {}, commit names {}", entry.account, req.account);
            return Err(self.violation(req, detail));
        }

        let balance = self
            .ledger
            .settle(&req.account, &Self::reservation(req))
            .map_err(|e| match e {
                BankError::InvariantViolation(detail) => self.violation(req, detail),
                other => other,
            })?;

        entry.settle(LegState::Committed);
        info!(
            bank = %self.name,
            tx_id = %req.tx_id,
            kind = %req.kind,
            account = %req.account,
            amount = %req.amount,
            balance = %balance,
            "Leg committed"
        );
        Ok(balance)
    }

    /// Unwind a prepared leg. Only the transaction holding the lock can
    /// clear it; any other case is acknowledged without effect.
    pub fn release(&self, req: &ReleaseRequest) -> Result<(), BankError> {
        match self.ledger.release(&req.account, &req.tx_id)? {
            ReleaseOutcome::Released => {
                for kind in [LegKind::Debit, LegKind::Credit] {
                    if let Some(mut entry) = self.legs.get_mut(&(req.tx_id.clone(), kind))
                        && entry.account == req.account
                        && entry.state.can_transition_to(LegState::Released)
                    {
                        entry.settle(LegState::Released);
                    }
                }
                info!(bank = %self.name, tx_id = %req.tx_id, account = %req.account, "Lock released");
            }
            ReleaseOutcome::NotHeld => {
                debug!(tx_id = %req.tx_id, account = %req.account, "Release of unlocked account");
            }
            ReleaseOutcome::HeldByOther(holder) => {
                warn!(
                    tx_id = %req.tx_id,
                    account = %req.account,
                    holder = %holder,
                    "Release ignored, lock belongs to another transaction"
                );
            }
        }
        Ok(())
    }

    pub fn balance(&self, account: &AccountId) -> Result<Amount, BankError> {
        self.ledger.balance(account)
    }

    /// Number of remembered legs, prepared or settled.
    pub fn leg_count(&self) -> usize {
        self.legs.len()
    }

    /// Forget committed and released legs settled more than `retention`
    /// ago. Prepared legs are never evicted.
    pub fn sweep_settled(&self, retention: Duration) -> usize {
        let now = Instant::now();
        let before = self.legs.len();
        self.legs.retain(|_, e| match e.settled_at {
            Some(at) => now.duration_since(at) < retention,
            None => true,
        });
        let evicted = before.saturating_sub(self.legs.len());
        if evicted > 0 {
            debug!(bank = %self.name, evicted, "Settled legs evicted");
        }
        evicted
    }

    fn violation(&self, req: &LegRequest, detail: String) -> BankError {
        error!(
            bank = %self.name,
            tx_id = %req.tx_id,
            kind = %req.kind,
            account = %req.account,
            detail = %detail,
            "Internal invariant violated on commit"
        );
        BankError::InvariantViolation(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LockPolicy;
    use std::sync::Arc;
    use std::time::Duration;

    fn service() -> BankService {
        let ledger = AccountLedger::new(
            [
                (AccountId::new("A1"), Amount::from_major(100)),
                (AccountId::new("A2"), Amount::ZERO),
            ],
            LockPolicy::default(),
        );
        BankService::new(BankName::from_index(1), ledger)
    }

    fn leg(tx: &str, kind: LegKind, account: &str, major: u64) -> LegRequest {
        LegRequest {
            kind,
            account: AccountId::new(account),
            amount: Amount::from_major(major),
            tx_id: TxId::new(tx),
        }
    }

    #[tokio::test]
    async fn test_prepare_then_commit_debit() {
        let bank = service();
        let req = leg("t1", LegKind::Debit, "A1", 50);

        bank.prepare(&req).await.unwrap();
        assert_eq!(bank.leg_state(&req.tx_id, LegKind::Debit), Some(LegState::Prepared));
        // prepare never mutates
        assert_eq!(bank.balance(&req.account).unwrap(), Amount::from_major(100));

        assert_eq!(bank.commit(&req).unwrap(), Amount::from_major(50));
        assert_eq!(bank.leg_state(&req.tx_id, LegKind::Debit), Some(LegState::Committed));
        assert!(bank.ledger().holder(&req.account).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_is_idempotent() {
        let bank = service();
        let req = leg("t1", LegKind::Credit, "A2", 30);
        bank.prepare(&req).await.unwrap();
        bank.commit(&req).unwrap();
        bank.commit(&req).unwrap();
        assert_eq!(bank.balance(&req.account).unwrap(), Amount::from_major(30));
    }

    #[tokio::test]
    async fn test_prepare_rejections_leave_account_idle() {
        let bank = service();

        let err = bank.prepare(&leg("t1", LegKind::Debit, "A2", 1)).await;
        assert_eq!(err, Err(BankError::InsufficientBalance));
        assert!(bank.ledger().holder(&AccountId::new("A2")).unwrap().is_none());
        assert_eq!(bank.leg_state(&TxId::new("t1"), LegKind::Debit), None);

        let err = bank.prepare(&leg("t1", LegKind::Credit, "ZZ", 1)).await;
        assert!(matches!(err, Err(BankError::UnknownAccount(_))));

        let err = bank.prepare(&leg("t1", LegKind::Credit, "A2", 0)).await;
        assert!(matches!(err, Err(BankError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_commit_without_prepare_is_invariant_violation() {
        let bank = service();
        let req = leg("t1", LegKind::Debit, "A1", 10);
        assert!(matches!(
            bank.commit(&req),
            Err(BankError::InvariantViolation(_))
        ));
        assert_eq!(bank.balance(&req.account).unwrap(), Amount::from_major(100));
    }

    #[tokio::test]
    async fn test_commit_with_different_amount_is_invariant_violation() {
        let bank = service();
        bank.prepare(&leg("t1", LegKind::Debit, "A1", 10)).await.unwrap();
        assert!(matches!(
            bank.commit(&leg("t1", LegKind::Debit, "A1", 20)),
            Err(BankError::InvariantViolation(_))
        ));
        assert_eq!(bank.balance(&AccountId::new("A1")).unwrap(), Amount::from_major(100));
    }

    #[tokio::test]
    async fn test_release_unwinds_prepared_leg() {
        let bank = service();
        let req = leg("t1", LegKind::Debit, "A1", 10);
        bank.prepare(&req).await.unwrap();

        bank.release(&ReleaseRequest {
            account: req.account.clone(),
            tx_id: req.tx_id.clone(),
        })
        .unwrap();

        assert_eq!(bank.leg_state(&req.tx_id, LegKind::Debit), Some(LegState::Released));
        assert!(matches!(
            bank.commit(&req),
            Err(BankError::InvariantViolation(_))
        ));
        assert_eq!(bank.balance(&req.account).unwrap(), Amount::from_major(100));
    }

    #[tokio::test]
    async fn test_release_from_other_transaction_is_ignored() {
        let bank = service();
        let req = leg("t1", LegKind::Debit, "A1", 10);
        bank.prepare(&req).await.unwrap();

        bank.release(&ReleaseRequest {
            account: req.account.clone(),
            tx_id: TxId::new("t2"),
        })
        .unwrap();

        assert_eq!(
            bank.ledger().holder(&req.account).unwrap().map(|r| r.tx_id),
            Some(TxId::new("t1"))
        );
        bank.commit(&req).unwrap();
    }

    #[tokio::test]
    async fn test_release_unknown_account() {
        let bank = service();
        let err = bank.release(&ReleaseRequest {
            account: AccountId::new("ZZ"),
            tx_id: TxId::new("t1"),
        });
        assert!(matches!(err, Err(BankError::UnknownAccount(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_evicts_only_settled_legs() {
        let bank = service();
        let committed = leg("t1", LegKind::Debit, "A1", 10);
        let released = leg("t2", LegKind::Credit, "A2", 10);
        let pending = leg("t3", LegKind::Debit, "A1", 10);

        bank.prepare(&committed).await.unwrap();
        bank.commit(&committed).unwrap();
        bank.prepare(&released).await.unwrap();
        bank.release(&ReleaseRequest {
            account: released.account.clone(),
            tx_id: released.tx_id.clone(),
        })
        .unwrap();
        bank.prepare(&pending).await.unwrap();
        assert_eq!(bank.leg_count(), 3);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(bank.sweep_settled(Duration::from_secs(60)), 0);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(bank.sweep_settled(Duration::from_secs(60)), 2);
        assert_eq!(bank.leg_state(&pending.tx_id, LegKind::Debit), Some(LegState::Prepared));
        assert_eq!(bank.leg_state(&committed.tx_id, LegKind::Debit), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_prepares_exactly_one_wins() {
        let bank = Arc::new(service());
        let first = leg("t1", LegKind::Debit, "A1", 10);
        let second = leg("t2", LegKind::Debit, "A1", 10);

        bank.prepare(&first).await.unwrap();

        let contender = {
            let bank = bank.clone();
            tokio::spawn(async move { bank.prepare(&second).await })
        };

        // holder keeps the lock through every retry
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(contender.await.unwrap(), Err(BankError::ParticipantBusy));
        bank.commit(&first).unwrap();
        assert_eq!(bank.balance(&first.account).unwrap(), Amount::from_major(90));
    }
}
