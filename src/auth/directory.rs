//! User directory: username → bank and account.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use super::Identity;
use crate::core_types::{AccountId, BankName};

#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub username: String,
    #[serde(default)]
    pub role: String,
    pub account_no: AccountId,
    pub bank_name: BankName,
}

#[derive(Debug, Default)]
pub struct UserDirectory {
    users: HashMap<String, UserRecord>,
}

impl UserDirectory {
    pub fn new(records: impl IntoIterator<Item = UserRecord>) -> Self {
        let users = records
            .into_iter()
            .map(|r| (r.username.clone(), r))
            .collect();
        Self { users }
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let records: Vec<UserRecord> =
            serde_json::from_str(json).context("Malformed user directory")?;
        Ok(Self::new(records))
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read user directory: {}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn get(&self, username: &str) -> Option<&UserRecord> {
        self.users.get(username)
    }

    pub fn identity(&self, username: &str) -> Option<Identity> {
        self.get(username).map(|r| Identity {
            username: r.username.clone(),
            bank: r.bank_name.clone(),
            account: r.account_no.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
