//! Payment Gateway (coordinator)
//!
//! Public HTTP surface. Clients pay and query balances with a bearer token;
//! bank servers register themselves once at startup.

pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tracing::info;

use crate::transfer::TransferCoordinator;
use state::AppState;

pub const HEALTH_PATH: &str = "/api/v1/health";
pub const REGISTER_PATH: &str = crate::bank::registration::REGISTER_PATH;
pub const TRANSFER_PATH: &str = "/api/v1/transfer";
pub const BALANCE_PATH: &str = "/api/v1/balance";

pub fn router(coordinator: Arc<TransferCoordinator>) -> Router {
    let state = Arc::new(AppState::new(coordinator));

    Router::new()
        .route(HEALTH_PATH, get(handlers::health_check))
        .route(REGISTER_PATH, post(handlers::register_bank))
        .route(TRANSFER_PATH, post(handlers::create_transfer))
        .route(BALANCE_PATH, get(handlers::get_balance))
        .with_state(state)
}

/// Serve the gateway on an already bound listener until the server stops.
pub async fn serve(listener: TcpListener, coordinator: Arc<TransferCoordinator>) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "Gateway listening");
    axum::serve(listener, router(coordinator)).await?;
    Ok(())
}
