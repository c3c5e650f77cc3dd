//! Leg table sweeper.
//!
//! The participant remembers every `(tx_id, kind)` it has seen so duplicate
//! commits are acknowledged. Settled entries are only needed while the
//! gateway could still resend, so they are evicted after a retention period.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::service::BankService;

pub struct LegSweeper {
    bank: Arc<BankService>,
    sweep_interval: Duration,
    retention: Duration,
}

impl LegSweeper {
    pub fn new(bank: Arc<BankService>, sweep_interval: Duration, retention: Duration) -> Self {
        Self {
            bank,
            sweep_interval,
            retention,
        }
    }

    pub async fn run(&self) {
        info!(
            bank = %self.bank.name(),
            sweep_interval_secs = self.sweep_interval.as_secs(),
            retention_secs = self.retention.as_secs(),
            "Starting leg sweeper"
        );

        let mut ticker = tokio::time::interval(self.sweep_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let evicted = self.bank.sweep_settled(self.retention);
            debug!(evicted, remaining = self.bank.leg_count(), "Leg table swept");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{AccountId, BankName, LegKind, TxId};
    use crate::ledger::{AccountLedger, LockPolicy};
    use crate::money::Amount;
    use crate::protocol::LegRequest;

    #[tokio::test(start_paused = true)]
    async fn test_run_loop_evicts_committed_legs() {
        let bank = Arc::new(BankService::new(
            BankName::from_index(1),
            AccountLedger::new(
                [(AccountId::new("A1"), Amount::from_major(10))],
                LockPolicy::default(),
            ),
        ));
        let req = LegRequest {
            kind: LegKind::Debit,
            account: AccountId::new("A1"),
            amount: Amount::from_major(1),
            tx_id: TxId::new("t1"),
        };
        bank.prepare(&req).await.unwrap();
        bank.commit(&req).unwrap();

        let sweeper = LegSweeper::new(
            bank.clone(),
            Duration::from_secs(10),
            Duration::from_secs(30),
        );
        let handle = tokio::spawn(async move { sweeper.run().await });

        tokio::time::sleep(Duration::from_secs(45)).await;
        assert_eq!(bank.leg_count(), 0);
        handle.abort();
    }
}
