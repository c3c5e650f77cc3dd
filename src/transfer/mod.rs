//! Interbank Transfer Coordinator
//!
//! Moves money between accounts held by two independent bank servers with
//! two-phase commit.
//!
//! # Architecture
//!
//! - **Bank registry**: participant name → adapter, filled by one-time
//!   registration
//! - **Idempotency cache**: `tx_id` → in-progress or terminal outcome
//! - **Participant adapters**: HTTP for remote banks, direct calls for banks
//!   in the same process
//!
//! # Safety Invariants
//!
//! 1. **Claim-Before-Call**: the `tx_id` is marked in progress before any
//!    participant is contacted; at most one two-phase sequence per `tx_id`
//! 2. **Terminal Is Final**: a succeeded or failed record never changes
//! 3. **Tx-Scoped Release**: a release only clears a lock held by the same
//!    `tx_id`
//! 4. **No Commit Rollback**: commit-phase failures are recorded, never undone

pub mod adapters;
pub mod cache;
pub mod coordinator;
pub mod error;
pub mod registry;
pub mod state;
pub mod types;
pub mod worker;


// Re-exports for convenience
pub use coordinator::TransferCoordinator;
pub use error::TransferError;
pub use state::TransferStatus;
pub use types::{Party, TransactionRecord, TransferReceipt, TransferRequest};
pub use worker::{CacheSweeper, SweeperConfig};
