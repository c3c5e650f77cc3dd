//! Interactive payment client.
//!
//! ```text
//! client [--env dev] [--token <jwt>]
//!
//! > balance
//! > pay bank2 B1 50.00
//! > offline
//! > quit
//! ```

use std::sync::Arc;

use anyhow::{Context, bail};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

use interbank_2pc::client::{
    ClientRequest, Delivery, Dispatcher, HttpGateway, OfflineQueue, QueueDrainer, RetryPolicy,
};
use interbank_2pc::config::AppConfig;
use interbank_2pc::core_types::{AccountId, BankName, TxId};
use interbank_2pc::logging::init_logging;
use interbank_2pc::money::Amount;
use interbank_2pc::protocol::TransferApiRequest;

fn arg_value(flag: &str) -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1).cloned())
}

enum Command {
    Send(ClientRequest),
    Offline,
    Quit,
}

/// `bank2` and `2` both name the second bank.
fn parse_bank(s: &str) -> BankName {
    match s.parse::<u32>() {
        Ok(id) => BankName::from_index(id),
        Err(_) => BankName::new(s),
    }
}

fn parse_command(line: &str) -> anyhow::Result<Option<Command>> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let command = match parts.as_slice() {
        [] => return Ok(None),
        ["balance"] => Command::Send(ClientRequest::Balance),
        ["pay", bank, account, amount] => {
            let amount = Amount::parse_positive(amount)
                .with_context(|| format!("invalid amount {}", amount))?;
            Command::Send(ClientRequest::Pay(TransferApiRequest {
                recipient_bank: parse_bank(bank),
                recipient_account: AccountId::new(*account),
                amount,
                tx_id: TxId::generate(),
            }))
        }
        ["offline"] => Command::Offline,
        ["quit"] | ["exit"] => Command::Quit,
        _ => bail!("commands: balance | pay <bank> <account> <amount> | offline | quit"),
    };
    Ok(Some(command))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = arg_value("--env").unwrap_or_else(|| "dev".to_string());
    let app_config = AppConfig::load(&env)?;
    let config = app_config.client.clone();

    let _log_guard = init_logging(&app_config, "client");

    let token = arg_value("--token").unwrap_or_else(|| config.token.clone());
    if token.is_empty() {
        bail!("no token: pass --token or set client.token (see `gateway --issue-token <user>`)");
    }

    let api = Arc::new(HttpGateway::new(
        &config.gateway_url,
        token,
        reqwest::Client::new(),
    ));
    let offline = Arc::new(OfflineQueue::new(config.offline_interval()));
    let dispatcher = Arc::new(Dispatcher::new(
        api,
        RetryPolicy::from(&config),
        offline.clone(),
    ));

    let (report_tx, mut report_rx) = mpsc::unbounded_channel();
    let drainer = QueueDrainer::new(dispatcher.clone(), config.drain_poll(), report_tx);
    tokio::spawn(async move { drainer.run().await });
    tokio::spawn(async move {
        while let Some(report) = report_rx.recv().await {
            match report.result {
                Ok(resp) => println!("[queued] {} -> {}", report.request, resp),
                Err(e) => println!("[queued] {} -> error: {}", report.request, e),
            }
        }
    });

    info!(gateway = %config.gateway_url, "Client ready");
    println!("commands: balance | pay <bank> <account> <amount> | offline | quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(Some(c)) => c,
            Ok(None) => continue,
            Err(e) => {
                println!("{:#}", e);
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Offline => {
                offline.set_offline();
                println!(
                    "offline for {}s, requests will be queued",
                    offline.interval().as_secs()
                );
            }
            Command::Send(req) => match dispatcher.submit(req.clone()).await {
                Ok(Delivery::Completed(resp)) => println!("{}", resp),
                Ok(Delivery::Queued) => println!("queued for later delivery: {}", req),
                Err(e) => println!("{} failed: {}", req.kind(), e),
            },
        }
    }

    if !offline.is_empty() {
        println!("{} queued request(s) not delivered", offline.len());
    }
    Ok(())
}
