//! Payment gateway (coordinator).
//!
//! ```text
//! gateway [--env dev] [--port 8080]
//! gateway [--env dev] --issue-token <username>    # print a dev token and exit
//! ```

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};

use interbank_2pc::auth::{JwtIdentityOracle, UserDirectory, issue_token};
use interbank_2pc::config::AppConfig;
use interbank_2pc::gateway;
use interbank_2pc::logging::init_logging;
use interbank_2pc::transfer::adapters::HttpConnector;
use interbank_2pc::transfer::{CacheSweeper, SweeperConfig, TransferCoordinator};

fn arg_value(flag: &str) -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1).cloned())
}

fn get_env() -> String {
    arg_value("--env")
        .or_else(|| arg_value("-e"))
        .unwrap_or_else(|| "dev".to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env)?;
    let config = app_config.gateway.clone();

    if let Some(username) = arg_value("--issue-token") {
        let directory = UserDirectory::load(&config.users_file)?;
        if directory.get(&username).is_none() {
            anyhow::bail!("unknown user {}", username);
        }
        println!(
            "{}",
            issue_token(&config.jwt_secret, &username, chrono::Duration::hours(24))?
        );
        return Ok(());
    }

    let _log_guard = init_logging(&app_config, "gateway");
    info!(env = %env, "Starting payment gateway");

    let port = match arg_value("--port") {
        Some(p) => p.parse().with_context(|| format!("invalid --port {}", p))?,
        None => config.port,
    };

    let directory = UserDirectory::load(&config.users_file)?;
    info!(users = directory.len(), file = %config.users_file, "User directory loaded");

    let coordinator = Arc::new(TransferCoordinator::new(
        Arc::new(HttpConnector::default()),
        Arc::new(JwtIdentityOracle::new(&config.jwt_secret, directory)),
        config.rpc_timeout(),
    ));

    let sweeper = CacheSweeper::new(
        coordinator.clone(),
        SweeperConfig {
            sweep_interval: config.sweep_interval(),
            retention: config.retention(),
        },
    );
    tokio::spawn(async move { sweeper.run().await });

    let addr = format!("{}:{}", config.host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    if let Err(e) = gateway::serve(listener, coordinator).await {
        error!(error = %e, "Gateway stopped");
        return Err(e);
    }
    Ok(())
}
