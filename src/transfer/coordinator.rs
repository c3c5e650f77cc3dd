//! Transfer Coordinator
//!
//! Drives two-phase commit across the sender's and the recipient's bank. The
//! coordinator never touches balances: it sequences participant calls and
//! remembers outcomes by `tx_id`.
//!
//! ```text
//! prepare(debit)@sender ─ok─▶ prepare(credit)@recipient ─ok─▶ commit(debit) ─▶ commit(credit)
//!        │ fail                       │ fail
//!        ▼                            ▼
//!      abort                release(sender) ▶ abort
//! ```
//!
//! # Outcome policy
//! - Prepare phase, contention or unknown outcome (busy / timeout /
//!   unreachable): the cache record is dropped so the same `tx_id` can retry.
//! - Prepare phase, business rejection: terminal, cached.
//! - Commit phase, any failure: terminal (`CommitIncomplete` or `Timeout`),
//!   logged at error level, never rolled back.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::adapters::{LegError, Participant, ParticipantConnector};
use super::cache::{Claim, TransactionCache};
use super::error::TransferError;
use super::registry::{BankRegistry, RegistryEntry};
use super::types::{Party, TransferReceipt, TransferRequest};
use crate::auth::{Identity, IdentityOracle};
use crate::core_types::{BankName, LegKind, TxId};
use crate::money::Amount;
use crate::protocol::TransferApiRequest;

/// Which phase a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Prepare,
    Commit,
}

struct PhaseFailure {
    phase: Phase,
    error: TransferError,
}

impl PhaseFailure {
    fn prepare(error: TransferError) -> Self {
        Self {
            phase: Phase::Prepare,
            error,
        }
    }

    fn commit(error: TransferError) -> Self {
        Self {
            phase: Phase::Commit,
            error,
        }
    }
}

/// Resolved sender, recipient and their participants.
struct Route {
    request: TransferRequest,
    sender: Arc<dyn Participant>,
    recipient: Arc<dyn Participant>,
}

/// One claimed two-phase sequence. Owns everything it touches so it can run
/// detached from the caller.
struct TwoPhase {
    route: Route,
    cache: Arc<TransactionCache>,
    rpc_timeout: Duration,
}

pub struct TransferCoordinator {
    registry: BankRegistry,
    cache: Arc<TransactionCache>,
    connector: Arc<dyn ParticipantConnector>,
    identity: Arc<dyn IdentityOracle>,
    rpc_timeout: Duration,
}

impl TransferCoordinator {
    pub fn new(
        connector: Arc<dyn ParticipantConnector>,
        identity: Arc<dyn IdentityOracle>,
        rpc_timeout: Duration,
    ) -> Self {
        Self {
            registry: BankRegistry::new(),
            cache: Arc::new(TransactionCache::new()),
            connector,
            identity,
            rpc_timeout,
        }
    }

    pub fn registry(&self) -> &BankRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &TransactionCache {
        &self.cache
    }

    /// One-time registration of a bank server.
    pub fn register_participant(&self, name: BankName, address: &str) -> Result<(), TransferError> {
        if name.as_str().trim().is_empty() {
            return Err(TransferError::InvalidRequest("bank name is required".into()));
        }
        if self.registry.contains(&name) {
            warn!(bank = %name, address = %address, "Duplicate bank registration rejected");
            return Err(TransferError::BankAlreadyRegistered(name.to_string()));
        }

        let participant = self.connector.connect(&name, address)?;
        self.registry
            .register(RegistryEntry {
                name: name.clone(),
                address: address.to_string(),
                participant,
            })
            .inspect_err(|_| {
                warn!(bank = %name, address = %address, "Duplicate bank registration rejected")
            })?;

        info!(bank = %name, address = %address, "Bank registered");
        Ok(())
    }

    pub fn authenticate(&self, token: &str) -> Result<Identity, TransferError> {
        self.identity.resolve(token)
    }

    /// Pay from the caller's own account.
    pub async fn transfer(
        &self,
        token: &str,
        req: TransferApiRequest,
    ) -> Result<TransferReceipt, TransferError> {
        let caller = self.authenticate(token)?;
        let request = TransferRequest {
            tx_id: req.tx_id,
            sender: Party::new(caller.bank, caller.account),
            recipient: Party::new(req.recipient_bank, req.recipient_account),
            amount: req.amount,
        };
        self.execute(request).await
    }

    /// Balance of the caller's own account.
    pub async fn balance(&self, token: &str) -> Result<(Identity, Amount), TransferError> {
        let caller = self.authenticate(token)?;
        let participant = self.registry.resolve(&caller.bank)?;
        let amount = bounded_call(
            self.rpc_timeout,
            &caller.bank,
            "balance",
            None,
            participant.balance(&caller.account),
        )
        .await?;
        Ok((caller, amount))
    }

    /// Run a resolved transfer, answering duplicates from the cache.
    ///
    /// Once the `tx_id` is claimed the two-phase sequence runs on its own
    /// task. Dropping this future (caller disconnect, client timeout) does
    /// not strand the record or the locks it took.
    pub async fn execute(&self, request: TransferRequest) -> Result<TransferReceipt, TransferError> {
        let route = self.route(request)?;
        let tx_id = route.request.tx_id.clone();

        match self.cache.begin(&route.request) {
            Claim::Fresh => {}
            Claim::InFlight => {
                info!(tx_id = %tx_id, "Duplicate request while in progress");
                return Err(TransferError::DuplicateInFlight);
            }
            Claim::Settled(outcome) => {
                info!(tx_id = %tx_id, ok = outcome.is_ok(), "Replaying cached outcome");
                return outcome;
            }
        }

        info!(
            tx_id = %tx_id,
            sender = %route.request.sender,
            recipient = %route.request.recipient,
            amount = %route.request.amount,
            "Transfer started"
        );

        let run = TwoPhase {
            route,
            cache: self.cache.clone(),
            rpc_timeout: self.rpc_timeout,
        };
        match tokio::spawn(run.run()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(tx_id = %tx_id, error = %e, "Transfer task died");
                self.cache.forget(&tx_id);
                Err(TransferError::Internal(format!("transfer task failed: {}", e)))
            }
        }
    }

    /// Validation and participant lookup. Nothing here is cached.
    fn route(&self, request: TransferRequest) -> Result<Route, TransferError> {
        if request.tx_id.is_empty() {
            return Err(TransferError::InvalidRequest("tx_id is required".into()));
        }
        if request.amount.is_zero() {
            return Err(TransferError::InvalidAmount);
        }
        if request.sender == request.recipient {
            return Err(TransferError::SameAccount);
        }
        let sender = self.registry.resolve(&request.sender.bank)?;
        let recipient = self.registry.resolve(&request.recipient.bank)?;
        Ok(Route {
            request,
            sender,
            recipient,
        })
    }
}

impl TwoPhase {
    /// Drive both phases and settle the cache record.
    async fn run(self) -> Result<TransferReceipt, TransferError> {
        let tx_id = self.route.request.tx_id.clone();

        match self.phases().await {
            Ok(receipt) => {
                info!(tx_id = %tx_id, "Transfer committed");
                self.cache.finish(&tx_id, Ok(receipt.clone()));
                Ok(receipt)
            }
            Err(PhaseFailure {
                phase: Phase::Prepare,
                error,
            }) if error.is_retryable() => {
                info!(tx_id = %tx_id, error = %error, "Prepare failed transiently, tx_id may be retried");
                self.cache.forget(&tx_id);
                Err(error)
            }
            Err(PhaseFailure { phase, error }) => {
                if phase == Phase::Commit {
                    error!(tx_id = %tx_id, error = %error, "Transfer left incomplete in commit phase");
                } else {
                    info!(tx_id = %tx_id, error = %error, "Transfer rejected");
                }
                self.cache.finish(&tx_id, Err(error.clone()));
                Err(error)
            }
        }
    }

    async fn phases(&self) -> Result<TransferReceipt, PhaseFailure> {
        self.prepare_phase().await.map_err(PhaseFailure::prepare)?;
        self.commit_phase().await.map_err(PhaseFailure::commit)?;
        Ok(TransferReceipt::succeeded(&self.route.request))
    }

    async fn prepare_phase(&self) -> Result<(), TransferError> {
        let route = &self.route;
        let req = &route.request;
        let tx_id = &req.tx_id;

        let debit = req.leg(LegKind::Debit);
        if let Err(e) = self
            .call(route.sender.name(), "prepare", Some(tx_id), route.sender.prepare(&debit))
            .await
        {
            // the recipient has not been contacted
            if outcome_unknown(&e) {
                self.release(route.sender.as_ref(), LegKind::Debit).await;
            }
            return Err(e);
        }

        let credit = req.leg(LegKind::Credit);
        if let Err(e) = self
            .call(
                route.recipient.name(),
                "prepare",
                Some(tx_id),
                route.recipient.prepare(&credit),
            )
            .await
        {
            self.release(route.sender.as_ref(), LegKind::Debit).await;
            if outcome_unknown(&e) {
                self.release(route.recipient.as_ref(), LegKind::Credit).await;
            }
            return Err(e);
        }

        debug!(tx_id = %tx_id, "Both legs prepared");
        Ok(())
    }

    async fn commit_phase(&self) -> Result<(), TransferError> {
        let route = &self.route;
        let req = &route.request;
        let tx_id = &req.tx_id;

        let debit = req.leg(LegKind::Debit);
        self.call(route.sender.name(), "commit", Some(tx_id), route.sender.commit(&debit))
            .await
            .map_err(|e| incomplete(e, "debit leg not committed, credit leg still prepared"))?;

        let credit = req.leg(LegKind::Credit);
        self.call(
            route.recipient.name(),
            "commit",
            Some(tx_id),
            route.recipient.commit(&credit),
        )
        .await
        .map_err(|e| incomplete(e, "debit leg committed, credit leg not committed"))?;

        Ok(())
    }

    /// Tx-scoped release; failures are logged and otherwise ignored.
    async fn release(&self, participant: &dyn Participant, kind: LegKind) {
        let req = &self.route.request;
        let release = req.release(kind);
        match self
            .call(
                participant.name(),
                "release",
                Some(&req.tx_id),
                participant.release(&release),
            )
            .await
        {
            Ok(()) => debug!(tx_id = %req.tx_id, bank = %participant.name(), kind = %kind, "Leg released"),
            Err(e) => warn!(
                tx_id = %req.tx_id,
                bank = %participant.name(),
                account = %release.account,
                error = %e,
                "Release failed, account may stay locked"
            ),
        }
    }

    async fn call<T>(
        &self,
        bank: &BankName,
        op: &'static str,
        tx_id: Option<&TxId>,
        fut: impl Future<Output = Result<T, LegError>>,
    ) -> Result<T, TransferError> {
        bounded_call(self.rpc_timeout, bank, op, tx_id, fut).await
    }
}

/// Bound one participant call by the RPC timeout and map its failure.
async fn bounded_call<T>(
    rpc_timeout: Duration,
    bank: &BankName,
    op: &'static str,
    tx_id: Option<&TxId>,
    fut: impl Future<Output = Result<T, LegError>>,
) -> Result<T, TransferError> {
    match tokio::time::timeout(rpc_timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(LegError::Rejected(e))) => {
            debug!(bank = %bank, op, tx_id = ?tx_id.map(TxId::as_str), error = %e, "Participant rejected call");
            Err(e.into())
        }
        Ok(Err(LegError::Unreachable(detail))) => {
            warn!(bank = %bank, op, tx_id = ?tx_id.map(TxId::as_str), detail = %detail, "Participant unreachable");
            Err(TransferError::ParticipantUnreachable(format!("{}: {}", bank, detail)))
        }
        Err(_) => {
            warn!(
                bank = %bank,
                op,
                tx_id = ?tx_id.map(TxId::as_str),
                timeout_ms = rpc_timeout.as_millis() as u64,
                "Participant call timed out"
            );
            Err(TransferError::Timeout)
        }
    }
}

/// The participant may or may not have acted on the call.
fn outcome_unknown(e: &TransferError) -> bool {
    matches!(
        e,
        TransferError::Timeout | TransferError::ParticipantUnreachable(_)
    )
}

fn incomplete(e: TransferError, state: &str) -> TransferError {
    match e {
        TransferError::Timeout => TransferError::Timeout,
        other => TransferError::CommitIncomplete(format!("{} ({})", state, other)),
    }
}
