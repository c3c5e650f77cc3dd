//! Background delivery of queued requests once the client is back online.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::dispatcher::Dispatcher;
use super::error::ClientError;
use super::request::{ClientRequest, ClientResponse};

/// Outcome of one drained request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainReport {
    pub request: ClientRequest,
    pub result: Result<ClientResponse, ClientError>,
}

pub struct QueueDrainer {
    dispatcher: Arc<Dispatcher>,
    poll_interval: Duration,
    reports: mpsc::UnboundedSender<DrainReport>,
}

impl QueueDrainer {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        poll_interval: Duration,
        reports: mpsc::UnboundedSender<DrainReport>,
    ) -> Self {
        Self {
            dispatcher,
            poll_interval,
            reports,
        }
    }

    /// Poll the offline flag forever, draining whenever it is clear.
    pub async fn run(&self) {
        let queue = self.dispatcher.offline();
        loop {
            if !queue.is_offline() && !queue.is_empty() {
                info!(depth = queue.len(), "Connection restored, processing queued requests");
                self.drain_once().await;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Deliver queued requests in FIFO order until the queue is empty or the
    /// client goes offline again. Returns the number delivered.
    pub async fn drain_once(&self) -> usize {
        let queue = self.dispatcher.offline();
        let mut delivered = 0;

        while !queue.is_offline() {
            let Some(request) = queue.front() else {
                break;
            };
            let result = self.dispatcher.dispatch(&request).await;
            queue.pop_front();

            match &result {
                Ok(resp) => info!(request = %request, response = %resp, "Queued request delivered"),
                Err(e) => warn!(request = %request, error = %e, "Queued request failed"),
            }
            if self.reports.send(DrainReport { request, result }).is_err() {
                debug!("Report receiver dropped");
            }
            delivered += 1;
        }
        delivered
    }
}
