//! Payment Client
//!
//! Retrying dispatcher in front of the gateway API, plus an offline mode
//! that parks requests and delivers them once the client is back online.

pub mod dispatcher;
pub mod drain;
pub mod error;
pub mod offline;
pub mod request;
pub mod transport;

pub use dispatcher::{Delivery, Dispatcher, RetryPolicy};
pub use drain::{DrainReport, QueueDrainer};
pub use error::ClientError;
pub use offline::OfflineQueue;
pub use request::{ClientRequest, ClientResponse, RequestKey};
pub use transport::{GatewayApi, HttpGateway};
