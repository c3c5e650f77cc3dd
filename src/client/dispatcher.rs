//! Client Dispatcher
//!
//! Every outbound call goes through [`Dispatcher`]: a per-attempt timeout,
//! classification of the outcome, and bounded retries with linear backoff.
//! While the client is offline, new requests are queued instead.
//!
//! ```text
//! submit ─offline?─yes─▶ OfflineQueue ─(QueueDrainer)─▶ dispatch
//!          │ no
//!          ▼
//!      dispatch: attempt ─ok──────────▶ Completed
//!                  │ retryable          │ terminal ─▶ Rejected
//!                  ▼
//!           backoff, attempt again (≤ max_attempts) ─▶ TimedOut
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::error::ClientError;
use super::offline::OfflineQueue;
use super::request::{ClientRequest, ClientResponse};
use super::transport::GatewayApi;
use crate::config::ClientConfig;
use crate::transfer::TransferError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    /// Wait `backoff_step * n` after the n-th failed attempt.
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            attempt_timeout: Duration::from_secs(5),
            backoff_step: Duration::from_secs(1),
        }
    }
}

impl From<&ClientConfig> for RetryPolicy {
    fn from(config: &ClientConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            attempt_timeout: Duration::from_millis(config.attempt_timeout_ms),
            backoff_step: Duration::from_millis(config.backoff_step_ms),
        }
    }
}

/// Outcome class of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Success,
    /// Timeout or contention: the same request may be sent again.
    Retryable,
    Terminal,
}

pub fn classify(result: &Result<ClientResponse, TransferError>) -> Class {
    match result {
        Ok(_) => Class::Success,
        Err(e) if e.is_retryable() => Class::Retryable,
        Err(_) => Class::Terminal,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Completed(ClientResponse),
    /// Parked in the offline queue; the outcome is reported when it drains.
    Queued,
}

pub struct Dispatcher {
    api: Arc<dyn GatewayApi>,
    policy: RetryPolicy,
    offline: Arc<OfflineQueue>,
}

impl Dispatcher {
    pub fn new(api: Arc<dyn GatewayApi>, policy: RetryPolicy, offline: Arc<OfflineQueue>) -> Self {
        Self {
            api,
            policy,
            offline,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn offline(&self) -> &Arc<OfflineQueue> {
        &self.offline
    }

    /// Send `req` now, or queue it if the client is offline.
    pub async fn submit(&self, req: ClientRequest) -> Result<Delivery, ClientError> {
        if self.offline.is_offline() {
            self.offline.push(req);
            return Ok(Delivery::Queued);
        }
        self.dispatch(&req).await.map(Delivery::Completed)
    }

    /// Send `req` through the retry path, ignoring the offline flag.
    pub async fn dispatch(&self, req: &ClientRequest) -> Result<ClientResponse, ClientError> {
        let mut last = TransferError::Timeout;

        for attempt in 1..=self.policy.max_attempts {
            let result = match tokio::time::timeout(self.policy.attempt_timeout, self.api.send(req))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(TransferError::Timeout),
            };

            match (classify(&result), result) {
                (Class::Retryable, Err(e)) => {
                    info!(request = %req, attempt, error = %e, "Attempt failed, will retry");
                    last = e;
                }
                (class, result) => {
                    debug!(request = %req, attempt, ?class, "Request finished");
                    return result.map_err(ClientError::Rejected);
                }
            }

            if attempt < self.policy.max_attempts {
                tokio::time::sleep(self.policy.backoff_step * attempt).await;
            }
        }

        warn!(request = %req, attempts = self.policy.max_attempts, error = %last, "Giving up");
        Err(ClientError::TimedOut {
            attempts: self.policy.max_attempts,
            last,
        })
    }
}
