//! Gateway and two bank servers over real HTTP on ephemeral ports.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use interbank_2pc::auth::{JwtIdentityOracle, UserDirectory, issue_token, issue_token_with_role};
use interbank_2pc::bank::{self, BankService, registration, seed};
use interbank_2pc::client::{
    ClientError, ClientRequest, ClientResponse, Delivery, Dispatcher, GatewayApi, HttpGateway,
    OfflineQueue, RetryPolicy,
};
use interbank_2pc::core_types::{AccountId, BankName, TxId};
use interbank_2pc::gateway;
use interbank_2pc::ledger::{AccountLedger, LockPolicy};
use interbank_2pc::money::Amount;
use interbank_2pc::protocol::TransferApiRequest;
use interbank_2pc::transfer::TransferError;
use interbank_2pc::transfer::adapters::HttpConnector;
use interbank_2pc::transfer::TransferCoordinator;

const SECRET: &str = "e2e-secret";
const CUSTOMERS: &str = include_str!("../sample_data/bank_customers.json");
const USERS: &str = include_str!("../sample_data/pg_users.json");

struct Cluster {
    gateway_url: String,
    bank1: Arc<BankService>,
    bank2: Arc<BankService>,
}

async fn start_bank(id: u32, gateway_url: &str) -> Arc<BankService> {
    let name = BankName::from_index(id);
    let accounts = seed::parse_customers(CUSTOMERS, &name).unwrap();
    let service = Arc::new(BankService::new(
        name.clone(),
        AccountLedger::new(accounts, LockPolicy::default()),
    ));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(bank::serve(listener, service.clone()));

    registration::register_with_gateway(
        &reqwest::Client::new(),
        gateway_url,
        &name,
        &address,
        Duration::from_secs(5),
    )
    .await
    .unwrap();
    service
}

async fn start_cluster() -> Cluster {
    let coordinator = Arc::new(TransferCoordinator::new(
        Arc::new(HttpConnector::default()),
        Arc::new(JwtIdentityOracle::new(
            SECRET,
            UserDirectory::from_json(USERS).unwrap(),
        )),
        Duration::from_secs(5),
    ));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let gateway_url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(gateway::serve(listener, coordinator));

    let bank1 = start_bank(1, &gateway_url).await;
    let bank2 = start_bank(2, &gateway_url).await;
    Cluster {
        gateway_url,
        bank1,
        bank2,
    }
}

fn client_for(cluster: &Cluster, user: &str) -> HttpGateway {
    let token = issue_token(SECRET, user, chrono::Duration::minutes(5)).unwrap();
    HttpGateway::new(&cluster.gateway_url, token, reqwest::Client::new())
}

fn pay(bank: u32, account: &str, amount: &str, tx: &str) -> TransferApiRequest {
    TransferApiRequest {
        recipient_bank: BankName::from_index(bank),
        recipient_account: AccountId::new(account),
        amount: Amount::parse(amount).unwrap(),
        tx_id: TxId::new(tx),
    }
}

#[tokio::test]
async fn test_transfer_over_http() {
    let cluster = start_cluster().await;
    let alice = client_for(&cluster, "alice");
    let bob = client_for(&cluster, "bob");

    let resp = alice.pay(&pay(2, "B1", "50.00", "e2e-1")).await.unwrap();
    assert_eq!(resp.status, "SUCCEEDED");
    assert_eq!(resp.tx_id, TxId::new("e2e-1"));

    assert_eq!(alice.balance().await.unwrap().balance, Amount::from_major(50));
    assert_eq!(bob.balance().await.unwrap().balance, Amount::from_major(50));

    // same tx_id again: cached, no second debit
    let again = alice.pay(&pay(2, "B1", "50.00", "e2e-1")).await.unwrap();
    assert_eq!(again, resp);
    assert_eq!(
        cluster.bank1.balance(&AccountId::new("A1")).unwrap(),
        Amount::from_major(50)
    );
    assert_eq!(
        cluster.bank2.balance(&AccountId::new("B1")).unwrap(),
        Amount::from_major(50)
    );
}

#[tokio::test]
async fn test_rejections_decode_to_typed_errors() {
    let cluster = start_cluster().await;
    let alice = client_for(&cluster, "alice");

    assert_eq!(
        alice.pay(&pay(2, "B1", "1000.00", "e2e-1")).await,
        Err(TransferError::InsufficientBalance)
    );
    assert!(matches!(
        alice.pay(&pay(2, "B9", "1.00", "e2e-2")).await,
        Err(TransferError::UnknownAccount(_))
    ));
    assert!(matches!(
        alice.pay(&pay(9, "Z1", "1.00", "e2e-3")).await,
        Err(TransferError::UnknownBank(_))
    ));
    assert_eq!(
        alice.pay(&pay(1, "A1", "1.00", "e2e-4")).await,
        Err(TransferError::SameAccount)
    );

    let forged = HttpGateway::new(&cluster.gateway_url, "not-a-jwt", reqwest::Client::new());
    assert_eq!(forged.balance().await, Err(TransferError::InvalidToken));

    // sender lock released after the recipient leg failed
    assert!(
        cluster
            .bank1
            .ledger()
            .holder(&AccountId::new("A1"))
            .unwrap()
            .is_none()
    );
    assert_eq!(
        cluster.bank1.balance(&AccountId::new("A1")).unwrap(),
        Amount::from_major(100)
    );
}

#[tokio::test]
async fn test_non_customer_token_cannot_pay() {
    let cluster = start_cluster().await;
    let token =
        issue_token_with_role(SECRET, "alice", "admin", chrono::Duration::minutes(5)).unwrap();
    let admin = HttpGateway::new(&cluster.gateway_url, token.clone(), reqwest::Client::new());

    assert_eq!(
        admin.pay(&pay(2, "B1", "1.00", "e2e-admin")).await,
        Err(TransferError::Forbidden("admin".into()))
    );
    assert_eq!(
        admin.balance().await,
        Err(TransferError::Forbidden("admin".into()))
    );

    let status = reqwest::Client::new()
        .post(format!("{}{}", cluster.gateway_url, gateway::TRANSFER_PATH))
        .bearer_auth(&token)
        .json(&pay(2, "B1", "1.00", "e2e-admin"))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status, reqwest::StatusCode::FORBIDDEN);
    assert_eq!(
        cluster.bank1.balance(&AccountId::new("A1")).unwrap(),
        Amount::from_major(100)
    );
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let cluster = start_cluster().await;
    let err = registration::register_with_gateway(
        &reqwest::Client::new(),
        &cluster.gateway_url,
        &BankName::from_index(1),
        "http://127.0.0.1:1",
        Duration::from_secs(5),
    )
    .await;
    assert!(err.is_err());
}

#[tokio::test]
async fn test_dispatcher_through_gateway() {
    let cluster = start_cluster().await;
    let offline = Arc::new(OfflineQueue::new(Duration::from_secs(15)));
    let dispatcher = Dispatcher::new(
        Arc::new(client_for(&cluster, "carol")),
        RetryPolicy::default(),
        offline.clone(),
    );

    let delivery = dispatcher
        .submit(ClientRequest::Pay(pay(2, "B2", "0.25", "e2e-1")))
        .await
        .unwrap();
    assert!(matches!(delivery, Delivery::Completed(ClientResponse::Paid(_))));
    assert_eq!(
        cluster.bank2.balance(&AccountId::new("B2")).unwrap(),
        Amount::parse("740.50").unwrap()
    );

    let err = dispatcher
        .submit(ClientRequest::Pay(pay(2, "B2", "9999.00", "e2e-2")))
        .await;
    assert_eq!(
        err,
        Err(ClientError::Rejected(TransferError::InsufficientBalance))
    );

    offline.set_offline();
    assert_eq!(
        dispatcher.submit(ClientRequest::Balance).await,
        Ok(Delivery::Queued)
    );
    assert_eq!(offline.len(), 1);
}
