use std::sync::Arc;

use crate::transfer::TransferCoordinator;

/// Shared gateway state
#[derive(Clone)]
pub struct AppState {
    /// Registry, idempotency cache and two-phase commit driver
    pub coordinator: Arc<TransferCoordinator>,
}

impl AppState {
    pub fn new(coordinator: Arc<TransferCoordinator>) -> Self {
        Self { coordinator }
    }
}
