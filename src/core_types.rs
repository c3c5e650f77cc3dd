//! Core identifier types shared by the gateway, the bank servers and the client.
//!
//! All of them travel over the wire as plain strings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Account number inside one bank (e.g. `"A1"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Registered name of a bank server (e.g. `"bank1"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BankName(String);

impl BankName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Name a bank server gets from its numeric id on the command line.
    pub fn from_index(id: u32) -> Self {
        Self(format!("bank{}", id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BankName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BankName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Caller-generated transaction id.
///
/// The gateway never mints these: the client picks one per logical payment and
/// reuses it on every retry so the gateway can answer duplicates from its cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(String);

impl TxId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh, globally unique id (ULID: sortable, no coordination needed).
    pub fn generate() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TxId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Which side of a transfer a participant is asked to prepare or commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegKind {
    /// Sender leg: funds leave the account on commit.
    Debit,
    /// Recipient leg: funds arrive on commit.
    Credit,
}

impl LegKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LegKind::Debit => "DEBIT",
            LegKind::Credit => "CREDIT",
        }
    }
}

impl fmt::Display for LegKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tx_ids_are_unique() {
        let a = TxId::generate();
        let b = TxId::generate();
        assert_ne!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_bank_name_from_index() {
        assert_eq!(BankName::from_index(1).as_str(), "bank1");
        assert_eq!(BankName::from_index(12).to_string(), "bank12");
    }

    #[test]
    fn test_leg_kind_wire_format() {
        assert_eq!(serde_json::to_string(&LegKind::Debit).unwrap(), "\"debit\"");
        let kind: LegKind = serde_json::from_str("\"credit\"").unwrap();
        assert_eq!(kind, LegKind::Credit);
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let id = AccountId::new("A1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"A1\"");
        assert!(TxId::new("   ").is_empty());
    }
}
