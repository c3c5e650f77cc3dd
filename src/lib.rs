//! Interbank Payments - two-phase commit across independent bank servers
//!
//! # Modules
//!
//! - [`core_types`] - Identifiers (AccountId, BankName, TxId, LegKind)
//! - [`money`] - Fixed-point amounts in minor units
//! - [`ledger`] - In-memory accounts with tx-scoped locks
//! - [`bank`] - Participant state machine and its HTTP surface
//! - [`transfer`] - Coordinator: registry, idempotency cache, two-phase commit
//! - [`auth`] - Bearer token to account identity
//! - [`gateway`] - Coordinator HTTP surface
//! - [`client`] - Retrying dispatcher and offline queue
//! - [`protocol`] - Wire envelope, DTOs and error codes

pub mod core_types;
pub mod money;
pub mod protocol;

// Participant side
pub mod bank;
pub mod ledger;

// Coordinator side
pub mod auth;
pub mod gateway;
pub mod transfer;

pub mod client;

// Ambient
pub mod config;
pub mod logging;

pub use core_types::{AccountId, BankName, LegKind, TxId};
pub use money::Amount;
