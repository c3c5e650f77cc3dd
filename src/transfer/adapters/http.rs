//! HTTP adapter for bank servers on the network.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{LegError, Participant, ParticipantConnector};
use crate::bank::{self, BankError};
use crate::core_types::{AccountId, BankName};
use crate::money::Amount;
use crate::protocol::{Ack, ApiResponse, BalanceData, LegRequest, ReleaseRequest};
use crate::transfer::error::TransferError;

pub struct HttpParticipant {
    name: BankName,
    base_url: String,
    http: reqwest::Client,
}

impl HttpParticipant {
    pub fn new(name: BankName, base_url: &str, http: reqwest::Client) -> Self {
        Self {
            name,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Account ids are percent-encoded as a single path segment.
    fn balance_url(&self, account: &AccountId) -> Result<reqwest::Url, LegError> {
        let bad_base = || LegError::Unreachable(format!("bad base url {}", self.base_url));
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|_| bad_base())?;
        url.path_segments_mut()
            .map_err(|_| bad_base())?
            .pop_if_empty()
            .extend(bank::balance_segments(account));
        Ok(url)
    }

    fn decode<T>(&self, resp: ApiResponse<T>) -> Result<T, LegError> {
        resp.into_result().map_err(|(code, msg)| {
            BankError::from_api(code, &msg)
                .map(LegError::Rejected)
                .unwrap_or_else(|| {
                    LegError::Unreachable(format!("{} answered code {}: {}", self.name, code, msg))
                })
        })
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, LegError> {
        let url = format!("{}{}", self.base_url, path);
        let resp: ApiResponse<T> = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| LegError::Unreachable(e.to_string()))?
            .json()
            .await
            .map_err(|e| LegError::Unreachable(format!("malformed response: {}", e)))?;
        self.decode(resp)
    }
}

#[async_trait]
impl Participant for HttpParticipant {
    fn name(&self) -> &BankName {
        &self.name
    }

    async fn prepare(&self, leg: &LegRequest) -> Result<(), LegError> {
        self.post::<_, Ack>(bank::PREPARE_PATH, leg).await.map(|_| ())
    }

    async fn commit(&self, leg: &LegRequest) -> Result<(), LegError> {
        self.post::<_, Ack>(bank::COMMIT_PATH, leg).await.map(|_| ())
    }

    async fn release(&self, req: &ReleaseRequest) -> Result<(), LegError> {
        self.post::<_, Ack>(bank::RELEASE_PATH, req).await.map(|_| ())
    }

    async fn balance(&self, account: &AccountId) -> Result<Amount, LegError> {
        let url = self.balance_url(account)?;
        let resp: ApiResponse<BalanceData> = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| LegError::Unreachable(e.to_string()))?
            .json()
            .await
            .map_err(|e| LegError::Unreachable(format!("malformed response: {}", e)))?;
        self.decode(resp).map(|data| data.balance)
    }
}

/// Connects registrations to [`HttpParticipant`]s sharing one connection pool.
#[derive(Clone, Default)]
pub struct HttpConnector {
    http: reqwest::Client,
}

impl HttpConnector {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl ParticipantConnector for HttpConnector {
    fn connect(
        &self,
        name: &BankName,
        address: &str,
    ) -> Result<Arc<dyn Participant>, TransferError> {
        let address = address.trim();
        if !(address.starts_with("http://") || address.starts_with("https://")) {
            return Err(TransferError::InvalidRequest(format!(
                "bank address must be an http(s) URL, got {:?}",
                address
            )));
        }
        Ok(Arc::new(HttpParticipant::new(
            name.clone(),
            address,
            self.http.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::BankService;
    use crate::ledger::{AccountLedger, LockPolicy};
    use crate::protocol::error_codes;

    #[test]
    fn test_connect_validates_address() {
        let connector = HttpConnector::default();
        let name = BankName::from_index(1);
        assert!(connector.connect(&name, "http://127.0.0.1:4000/").is_ok());
        assert!(matches!(
            connector.connect(&name, "127.0.0.1:4000"),
            Err(TransferError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_balance_url_encodes_account() {
        let participant = HttpParticipant::new(
            BankName::from_index(1),
            "http://127.0.0.1:4000/",
            reqwest::Client::new(),
        );
        let url = participant.balance_url(&AccountId::new("A 1/x?y")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:4000/internal/v1/accounts/A%201%2Fx%3Fy/balance"
        );
    }

    #[tokio::test]
    async fn test_balance_of_awkward_account_id() {
        let odd = AccountId::new("odd/id 1");
        let service = Arc::new(BankService::new(
            BankName::from_index(1),
            AccountLedger::new([(odd.clone(), Amount::from_major(7))], LockPolicy::default()),
        ));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(bank::serve(listener, service));

        let participant =
            HttpParticipant::new(BankName::from_index(1), &base, reqwest::Client::new());
        assert_eq!(participant.balance(&odd).await, Ok(Amount::from_major(7)));
    }

    #[test]
    fn test_decode_maps_bank_codes() {
        let participant =
            HttpParticipant::new(BankName::from_index(1), "http://x/", reqwest::Client::new());
        assert_eq!(participant.base_url(), "http://x");

        let busy = ApiResponse::<Ack> {
            code: error_codes::PARTICIPANT_BUSY,
            msg: "busy".into(),
            data: None,
        };
        assert_eq!(
            participant.decode(busy),
            Err(LegError::Rejected(BankError::ParticipantBusy))
        );

        let odd = ApiResponse::<Ack> {
            code: error_codes::UNKNOWN_BANK,
            msg: "?".into(),
            data: None,
        };
        assert!(matches!(participant.decode(odd), Err(LegError::Unreachable(_))));
    }
}
