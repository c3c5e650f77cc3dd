//! Offline Queue
//!
//! While the client is marked offline, new requests are parked here in
//! arrival order instead of being sent. The flag clears itself once the
//! offline interval has elapsed since it was last set.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use super::request::{ClientRequest, RequestKey};

#[derive(Default)]
struct Inner {
    queue: VecDeque<ClientRequest>,
    queued: HashSet<RequestKey>,
    offline_since: Option<Instant>,
}

pub struct OfflineQueue {
    inner: Mutex<Inner>,
    interval: Duration,
}

impl OfflineQueue {
    pub fn new(interval: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn inner(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Go offline now. Setting it again restarts the interval.
    pub fn set_offline(&self) {
        self.inner().offline_since = Some(Instant::now());
        info!(interval_secs = self.interval.as_secs(), "Client is offline");
    }

    pub fn is_offline(&self) -> bool {
        let mut inner = self.inner();
        match inner.offline_since {
            Some(since) if since.elapsed() >= self.interval => {
                inner.offline_since = None;
                info!("Client is back online");
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Append `req` unless a request with the same identity is already
    /// waiting. Returns whether it was added.
    pub fn push(&self, req: ClientRequest) -> bool {
        let mut inner = self.inner();
        if !inner.queued.insert(req.key()) {
            debug!(request = %req, "Already queued");
            return false;
        }
        info!(request = %req, depth = inner.queue.len() + 1, "Request queued for later delivery");
        inner.queue.push_back(req);
        true
    }

    /// Oldest waiting request, left in place until [`pop_front`](Self::pop_front).
    pub fn front(&self) -> Option<ClientRequest> {
        self.inner().queue.front().cloned()
    }

    pub fn pop_front(&self) -> Option<ClientRequest> {
        let mut inner = self.inner();
        let req = inner.queue.pop_front()?;
        inner.queued.remove(&req.key());
        Some(req)
    }

    pub fn len(&self) -> usize {
        self.inner().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner().queue.is_empty()
    }
}
