//! Bank Registry
//!
//! Participant name → address and connected adapter. Writes happen once per
//! bank at startup, so one coarse `RwLock` is enough.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::adapters::Participant;
use super::error::TransferError;
use crate::core_types::BankName;

#[derive(Clone)]
pub struct RegistryEntry {
    pub name: BankName,
    pub address: String,
    pub participant: Arc<dyn Participant>,
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("name", &self.name)
            .field("address", &self.address)
            .finish()
    }
}

#[derive(Default)]
pub struct BankRegistry {
    banks: RwLock<HashMap<BankName, RegistryEntry>>,
}

impl BankRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bank. A name that is already present is rejected, so a second
    /// instance can never shadow a live one.
    pub fn register(&self, entry: RegistryEntry) -> Result<(), TransferError> {
        let mut banks = self.banks.write().unwrap_or_else(PoisonError::into_inner);
        if banks.contains_key(&entry.name) {
            return Err(TransferError::BankAlreadyRegistered(entry.name.to_string()));
        }
        banks.insert(entry.name.clone(), entry);
        Ok(())
    }

    pub fn resolve(&self, name: &BankName) -> Result<Arc<dyn Participant>, TransferError> {
        self.banks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|e| e.participant.clone())
            .ok_or_else(|| TransferError::UnknownBank(name.to_string()))
    }

    pub fn address(&self, name: &BankName) -> Option<String> {
        self.banks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|e| e.address.clone())
    }

    pub fn contains(&self, name: &BankName) -> bool {
        self.banks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<BankName> {
        let mut names: Vec<_> = self
            .banks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}
