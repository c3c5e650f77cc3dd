//! Bank server (participant).
//!
//! ```text
//! bank_server <id> [--env dev] [--port 0]
//! ```
//!
//! Serves the accounts of `bank<id>` from the customers seed file and
//! registers once with the gateway.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};

use interbank_2pc::bank::{self, BankService, LegSweeper, registration, seed};
use interbank_2pc::config::AppConfig;
use interbank_2pc::core_types::BankName;
use interbank_2pc::ledger::AccountLedger;
use interbank_2pc::logging::init_logging;

const REGISTRATION_TIMEOUT: Duration = Duration::from_secs(5);

fn arg_value(flag: &str) -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1).cloned())
}

/// First positional argument.
fn bank_id() -> anyhow::Result<u32> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut i = 0;
    while i < args.len() {
        if args[i].starts_with('-') {
            i += 2;
            continue;
        }
        return args[i]
            .parse()
            .with_context(|| format!("bank id must be a number, got {}", args[i]));
    }
    anyhow::bail!("usage: bank_server <id> [--env <name>] [--port <port>]")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let id = bank_id()?;
    let name = BankName::from_index(id);
    let env = arg_value("--env").unwrap_or_else(|| "dev".to_string());
    let app_config = AppConfig::load(&env)?;
    let config = app_config.bank.clone();

    let _log_guard = init_logging(&app_config, name.as_str());
    info!(bank = %name, env = %env, "Starting bank server");

    let accounts = seed::load_customers(&config.customers_file, &name)?;
    let service = Arc::new(BankService::new(
        name.clone(),
        AccountLedger::new(accounts, config.lock_policy()),
    ));

    let port = match arg_value("--port") {
        Some(p) => p.parse().with_context(|| format!("invalid --port {}", p))?,
        None => config.port,
    };
    let listener = TcpListener::bind((config.host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, port))?;
    let address = format!("http://{}", listener.local_addr()?);

    let sweeper = LegSweeper::new(
        service.clone(),
        config.sweep_interval(),
        config.leg_retention(),
    );
    tokio::spawn(async move { sweeper.run().await });

    let server = tokio::spawn(bank::serve(listener, service));

    registration::register_with_gateway(
        &reqwest::Client::new(),
        &config.gateway_url,
        &name,
        &address,
        REGISTRATION_TIMEOUT,
    )
    .await
    .inspect_err(|e| error!(bank = %name, error = %e, "Registration failed"))?;

    server.await??;
    Ok(())
}
