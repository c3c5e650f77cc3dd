//! Gateway API as seen by the client.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::request::{ClientRequest, ClientResponse};
use crate::gateway::{BALANCE_PATH, TRANSFER_PATH};
use crate::protocol::{ApiResponse, BalanceData, TransferApiRequest, TransferApiResponse};
use crate::transfer::TransferError;

/// One attempt at a gateway call. Failures come back as the gateway's own
/// error taxonomy so the dispatcher can classify them.
#[async_trait]
pub trait GatewayApi: Send + Sync {
    async fn balance(&self) -> Result<BalanceData, TransferError>;

    async fn pay(&self, req: &TransferApiRequest) -> Result<TransferApiResponse, TransferError>;

    async fn send(&self, req: &ClientRequest) -> Result<ClientResponse, TransferError> {
        match req {
            ClientRequest::Balance => self.balance().await.map(ClientResponse::Balance),
            ClientRequest::Pay(pay) => self.pay(pay).await.map(ClientResponse::Paid),
        }
    }
}

pub struct HttpGateway {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: &str, token: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, TransferError> {
        let status = resp.status();
        let body: ApiResponse<T> = resp.json().await.map_err(|e| {
            TransferError::Internal(format!("malformed gateway response ({}): {}", status, e))
        })?;
        body.into_result()
            .map_err(|(code, msg)| TransferError::from_api(code, &msg))
    }
}

/// Connection failures are indistinguishable from a dead gateway.
fn unreachable(e: reqwest::Error) -> TransferError {
    TransferError::ParticipantUnreachable(format!("gateway: {}", e))
}

#[async_trait]
impl GatewayApi for HttpGateway {
    async fn balance(&self) -> Result<BalanceData, TransferError> {
        let resp = self
            .http
            .get(self.url(BALANCE_PATH))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(unreachable)?;
        Self::decode(resp).await
    }

    async fn pay(&self, req: &TransferApiRequest) -> Result<TransferApiResponse, TransferError> {
        let resp = self
            .http
            .post(self.url(TRANSFER_PATH))
            .bearer_auth(&self.token)
            .json(req)
            .send()
            .await
            .map_err(unreachable)?;
        Self::decode(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_join() {
        let gw = HttpGateway::new("http://127.0.0.1:8080/", "t", reqwest::Client::new());
        assert_eq!(gw.url(TRANSFER_PATH), "http://127.0.0.1:8080/api/v1/transfer");
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let gw = HttpGateway::new(&format!("http://{}", addr), "t", reqwest::Client::new());
        let err = gw.balance().await.unwrap_err();
        assert!(matches!(err, TransferError::ParticipantUnreachable(_)));
        assert!(err.is_retryable());
    }
}
