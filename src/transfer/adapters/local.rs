//! In-process adapter: the coordinator drives a `BankService` directly.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use super::{LegError, Participant, ParticipantConnector};
use crate::bank::BankService;
use crate::core_types::{AccountId, BankName};
use crate::money::Amount;
use crate::protocol::{LegRequest, ReleaseRequest};
use crate::transfer::error::TransferError;

pub struct LocalParticipant {
    bank: Arc<BankService>,
}

impl LocalParticipant {
    pub fn new(bank: Arc<BankService>) -> Self {
        Self { bank }
    }
}

#[async_trait]
impl Participant for LocalParticipant {
    fn name(&self) -> &BankName {
        self.bank.name()
    }

    async fn prepare(&self, leg: &LegRequest) -> Result<(), LegError> {
        Ok(self.bank.prepare(leg).await?)
    }

    async fn commit(&self, leg: &LegRequest) -> Result<(), LegError> {
        self.bank.commit(leg)?;
        Ok(())
    }

    async fn release(&self, req: &ReleaseRequest) -> Result<(), LegError> {
        Ok(self.bank.release(req)?)
    }

    async fn balance(&self, account: &AccountId) -> Result<Amount, LegError> {
        Ok(self.bank.balance(account)?)
    }
}

/// Resolves registration addresses to bank services in this process.
#[derive(Default)]
pub struct LocalConnector {
    banks: RwLock<HashMap<String, Arc<BankService>>>,
}

impl LocalConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `bank` reachable at `address`.
    pub fn attach(&self, address: impl Into<String>, bank: Arc<BankService>) {
        self.banks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(address.into(), bank);
    }
}

impl ParticipantConnector for LocalConnector {
    fn connect(
        &self,
        name: &BankName,
        address: &str,
    ) -> Result<Arc<dyn Participant>, TransferError> {
        let bank = self
            .banks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .cloned()
            .ok_or_else(|| {
                TransferError::ParticipantUnreachable(format!("nothing listens at {}", address))
            })?;

        if bank.name() != name {
            return Err(TransferError::InvalidRequest(format!(
                "{} is served by {}, not {}",
                address,
                bank.name(),
                name
            )));
        }
        Ok(Arc::new(LocalParticipant::new(bank)))
    }
}
