//! Retention Sweeper
//!
//! Background worker that evicts terminal transaction records once their
//! retention has passed, keeping the idempotency cache bounded.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::coordinator::TransferCoordinator;

/// Configuration for the retention sweeper
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// How often to scan the cache
    pub sweep_interval: Duration,
    /// How long a terminal record is replayed to duplicates
    pub retention: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(60),
            retention: Duration::from_secs(3_600),
        }
    }
}

/// In-progress records are never evicted.
pub struct CacheSweeper {
    coordinator: Arc<TransferCoordinator>,
    config: SweeperConfig,
}

impl CacheSweeper {
    pub fn new(coordinator: Arc<TransferCoordinator>, config: SweeperConfig) -> Self {
        Self {
            coordinator,
            config,
        }
    }

    /// Run the sweeper loop forever.
    pub async fn run(&self) {
        info!(
            sweep_interval_secs = self.config.sweep_interval.as_secs(),
            retention_secs = self.config.retention.as_secs(),
            "Starting retention sweeper"
        );

        let mut ticker = tokio::time::interval(self.config.sweep_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.sweep_once();
        }
    }

    /// Run a single sweep, returning the number of evicted records.
    pub fn sweep_once(&self) -> usize {
        let cache = self.coordinator.cache();
        let evicted = cache.sweep_expired(self.config.retention);
        if evicted > 0 {
            info!(evicted, remaining = cache.len(), "Transaction cache swept");
        } else {
            debug!(remaining = cache.len(), "Nothing to sweep");
        }
        evicted
    }
}
