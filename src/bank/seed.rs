//! Startup account data.
//!
//! The seed file maps each bank name to its customers:
//!
//! ```json
//! { "bank1": [ { "customer_name": "alice", "acc_no": "A1", "curr_balance": 100.00 } ] }
//! ```
//!
//! Balances may be JSON numbers or strings; both go through [`Amount::parse`].

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, bail};
use serde::Deserialize;

use crate::core_types::{AccountId, BankName};
use crate::money::Amount;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SeedBalance {
    Number(serde_json::Number),
    Text(String),
}

#[derive(Debug, Deserialize)]
pub struct CustomerRecord {
    pub customer_name: String,
    pub acc_no: AccountId,
    curr_balance: SeedBalance,
}

impl CustomerRecord {
    pub fn balance(&self) -> anyhow::Result<Amount> {
        let raw = match &self.curr_balance {
            SeedBalance::Number(n) => n.to_string(),
            SeedBalance::Text(s) => s.clone(),
        };
        Amount::parse(&raw)
            .with_context(|| format!("Invalid balance {:?} for account {}", raw, self.acc_no))
    }
}

/// Accounts of `bank` from a seed document.
pub fn parse_customers(json: &str, bank: &BankName) -> anyhow::Result<Vec<(AccountId, Amount)>> {
    let mut banks: HashMap<BankName, Vec<CustomerRecord>> =
        serde_json::from_str(json).context("Malformed customer seed")?;

    let Some(customers) = banks.remove(bank) else {
        bail!("No customers for {} in seed data", bank);
    };

    let mut seen = HashSet::with_capacity(customers.len());
    let mut accounts = Vec::with_capacity(customers.len());
    for customer in &customers {
        if !seen.insert(&customer.acc_no) {
            bail!("Duplicate account {} for {}", customer.acc_no, bank);
        }
        accounts.push((customer.acc_no.clone(), customer.balance()?));
    }
    Ok(accounts)
}

pub fn load_customers(path: impl AsRef<Path>, bank: &BankName) -> anyhow::Result<Vec<(AccountId, Amount)>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read customer seed: {}", path.display()))?;
    parse_customers(&content, bank)
}
