//! Bank Server (participant)
//!
//! Holds the accounts of one bank and answers the gateway's two-phase commit
//! calls. A bank never contacts another bank and has no knowledge of the
//! other leg of a transfer.
//!
//! ```text
//! gateway ──prepare(debit)──▶ bank1        gateway ──prepare(credit)──▶ bank2
//!         ◀──────ok─────────                        ◀────────ok─────────
//!         ──commit(debit)───▶ bank1        gateway ──commit(credit)───▶ bank2
//! ```

pub mod api;
pub mod error;
pub mod registration;
pub mod seed;
pub mod service;
pub mod state;
pub mod worker;

pub use error::BankError;
pub use service::BankService;
pub use state::LegState;
pub use worker::LegSweeper;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tracing::info;

pub const PREPARE_PATH: &str = "/internal/v1/prepare";
pub const COMMIT_PATH: &str = "/internal/v1/commit";
pub const RELEASE_PATH: &str = "/internal/v1/release";

pub const BALANCE_ROUTE: &str = "/internal/v1/accounts/{account}/balance";

/// Path segments of the balance route for `account`, unencoded. Callers
/// append them with a segment-encoding URL API.
pub fn balance_segments(account: &crate::core_types::AccountId) -> [&str; 5] {
    ["internal", "v1", "accounts", account.as_str(), "balance"]
}

pub fn router(bank: Arc<BankService>) -> Router {
    Router::new()
        .route(PREPARE_PATH, post(api::prepare))
        .route(COMMIT_PATH, post(api::commit))
        .route(RELEASE_PATH, post(api::release))
        .route(BALANCE_ROUTE, get(api::balance))
        .with_state(bank)
}

/// Serve the participant API on an already bound listener until the
/// server stops.
pub async fn serve(listener: TcpListener, bank: Arc<BankService>) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!(bank = %bank.name(), %addr, accounts = bank.ledger().len(), "Bank server listening");
    axum::serve(listener, router(bank)).await?;
    Ok(())
}
