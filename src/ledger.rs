//! Account Ledger
//!
//! In-memory balances for one bank server, one lock per account.
//!
//! # Locking
//!
//! A lock is a [`Reservation`] stored on the account: the transaction that
//! prepared it, the leg kind and the amount. Balances only change through
//! [`AccountLedger::settle`], [`AccountLedger::debit`] and
//! [`AccountLedger::credit`], and each requires the caller's transaction to
//! hold the reservation. Only the holder can release.
//!
//! Acquisition never blocks indefinitely: [`AccountLedger::acquire`] tries a
//! bounded number of times with linearly increasing backoff and then reports
//! [`BankError::ParticipantBusy`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, warn};

use crate::bank::error::BankError;
use crate::core_types::{AccountId, LegKind, TxId};
use crate::money::Amount;

/// Bounded retry policy for lock acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    /// Total attempts, including the first one
    pub attempts: u32,
    /// Sleep before attempt `n + 1` is `backoff_step * n`
    pub backoff_step: Duration,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_step: Duration::from_millis(100),
        }
    }
}

/// The lock record of a prepared leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub tx_id: TxId,
    pub kind: LegKind,
    pub amount: Amount,
}

/// One customer account.
#[derive(Debug)]
pub struct Account {
    pub id: AccountId,
    balance: Amount,
    lock: Option<Reservation>,
}

impl Account {
    pub fn new(id: AccountId, balance: Amount) -> Self {
        Self {
            id,
            balance,
            lock: None,
        }
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn lock(&self) -> Option<&Reservation> {
        self.lock.as_ref()
    }

    fn is_held_by(&self, tx_id: &TxId) -> bool {
        self.lock.as_ref().is_some_and(|r| &r.tx_id == tx_id)
    }

    /// A leg of `kind` for `amount` could be applied right now.
    fn check_funds(&self, kind: LegKind, amount: Amount) -> Result<(), BankError> {
        match kind {
            LegKind::Debit if self.balance < amount => Err(BankError::InsufficientBalance),
            LegKind::Credit if self.balance.checked_add(amount).is_none() => {
                Err(BankError::BalanceOverflow)
            }
            _ => Ok(()),
        }
    }

    fn apply(&mut self, kind: LegKind, amount: Amount) -> Result<Amount, BankError> {
        self.balance = match kind {
            LegKind::Debit => self
                .balance
                .checked_sub(amount)
                .ok_or(BankError::InsufficientBalance)?,
            LegKind::Credit => self
                .balance
                .checked_add(amount)
                .ok_or(BankError::BalanceOverflow)?,
        };
        Ok(self.balance)
    }
}

/// Result of a single lock attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    Acquired,
    /// Same transaction and leg already hold the lock (duplicate prepare).
    AlreadyHeld,
}

/// Result of a release request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released,
    NotHeld,
    /// Lock belongs to another transaction and was left untouched.
    HeldByOther(TxId),
}

/// All accounts of one bank. The account set is fixed at startup.
#[derive(Debug)]
pub struct AccountLedger {
    accounts: HashMap<AccountId, Mutex<Account>>,
    policy: LockPolicy,
}

impl AccountLedger {
    pub fn new(seed: impl IntoIterator<Item = (AccountId, Amount)>, policy: LockPolicy) -> Self {
        let accounts = seed
            .into_iter()
            .map(|(id, balance)| (id.clone(), Mutex::new(Account::new(id, balance))))
            .collect();
        Self { accounts, policy }
    }

    pub fn policy(&self) -> LockPolicy {
        self.policy
    }

    pub fn contains(&self, id: &AccountId) -> bool {
        self.accounts.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn account(&self, id: &AccountId) -> Result<MutexGuard<'_, Account>, BankError> {
        let cell = self
            .accounts
            .get(id)
            .ok_or_else(|| BankError::UnknownAccount(id.to_string()))?;
        // No code path panics while holding an account guard.
        Ok(cell.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn balance(&self, id: &AccountId) -> Result<Amount, BankError> {
        Ok(self.account(id)?.balance())
    }

    /// Current lock holder, if any.
    pub fn holder(&self, id: &AccountId) -> Result<Option<Reservation>, BankError> {
        Ok(self.account(id)?.lock().cloned())
    }

    /// Single, non-blocking lock attempt.
    ///
    /// Funds are checked under the same guard that takes the lock, so a debit
    /// reservation is never granted against a balance that cannot cover it.
    pub fn try_acquire(
        &self,
        id: &AccountId,
        reservation: &Reservation,
    ) -> Result<AcquireOutcome, BankError> {
        let mut account = self.account(id)?;

        match account.lock() {
            Some(held) if held == reservation => return Ok(AcquireOutcome::AlreadyHeld),
            Some(_) => return Err(BankError::ParticipantBusy),
            None => {}
        }

        account.check_funds(reservation.kind, reservation.amount)?;
        account.lock = Some(reservation.clone());
        Ok(AcquireOutcome::Acquired)
    }

    /// Lock `id` for `reservation`, retrying while another transaction holds it.
    pub async fn acquire(
        &self,
        id: &AccountId,
        reservation: &Reservation,
    ) -> Result<AcquireOutcome, BankError> {
        let attempts = self.policy.attempts.max(1);

        for attempt in 1..=attempts {
            match self.try_acquire(id, reservation) {
                Err(BankError::ParticipantBusy) if attempt < attempts => {
                    let backoff = self.policy.backoff_step * attempt;
                    debug!(
                        account = %id,
                        tx_id = %reservation.tx_id,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "Account locked, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                }
                other => return other,
            }
        }

        warn!(account = %id, tx_id = %reservation.tx_id, attempts, "Lock not acquired");
        Err(BankError::ParticipantBusy)
    }

    /// Clear the lock if `tx_id` holds it. A lock held by another
    /// transaction is never touched.
    pub fn release(&self, id: &AccountId, tx_id: &TxId) -> Result<ReleaseOutcome, BankError> {
        let mut account = self.account(id)?;
        let holder = account.lock().map(|r| r.tx_id.clone());
        let outcome = match holder {
            None => ReleaseOutcome::NotHeld,
            Some(held) if &held == tx_id => {
                account.lock = None;
                ReleaseOutcome::Released
            }
            Some(held) => ReleaseOutcome::HeldByOther(held),
        };
        Ok(outcome)
    }

    /// Apply a prepared leg and clear its lock under one guard.
    ///
    /// The lock must still be held by exactly `reservation`, and the leg must
    /// still be applicable. Anything else means commit arrived out of protocol
    /// order and is reported as [`BankError::InvariantViolation`].
    pub fn settle(&self, id: &AccountId, reservation: &Reservation) -> Result<Amount, BankError> {
        let mut account = self.account(id)?;
        if account.lock() != Some(reservation) {
            return Err(BankError::InvariantViolation(format!(
                "{} commit on {} by {} does not match the held lock",
                reservation.kind, id, reservation.tx_id
            )));
        }

        let balance = account
            .apply(reservation.kind, reservation.amount)
            .map_err(|e| {
                BankError::InvariantViolation(format!(
                    "{} re-validation on {} failed: {}",
                    reservation.kind, id, e
                ))
            })?;
        account.lock = None;
        Ok(balance)
    }

    /// Subtract `amount`. The account must be locked by `tx_id`.
    pub fn debit(&self, id: &AccountId, tx_id: &TxId, amount: Amount) -> Result<Amount, BankError> {
        let mut account = self.account(id)?;
        if !account.is_held_by(tx_id) {
            return Err(BankError::InvariantViolation(format!(
                "debit on {} without a lock held by {}",
                id, tx_id
            )));
        }
        account.apply(LegKind::Debit, amount)
    }

    /// Add `amount`. The account must be locked by `tx_id`.
    pub fn credit(&self, id: &AccountId, tx_id: &TxId, amount: Amount) -> Result<Amount, BankError> {
        let mut account = self.account(id)?;
        if !account.is_held_by(tx_id) {
            return Err(BankError::InvariantViolation(format!(
                "credit on {} without a lock held by {}",
                id, tx_id
            )));
        }
        account.apply(LegKind::Credit, amount)
    }
}
