//! One-time registration of a bank server with the payment gateway.

use std::time::Duration;

use anyhow::{Context, anyhow};
use tracing::info;

use crate::core_types::BankName;
use crate::protocol::{Ack, ApiResponse, RegisterBankRequest};

pub const REGISTER_PATH: &str = "/api/v1/banks/register";

/// Announce `name` at `address` to the gateway.
///
/// Fails if the gateway already knows a bank by this name.
pub async fn register_with_gateway(
    http: &reqwest::Client,
    gateway_url: &str,
    name: &BankName,
    address: &str,
    timeout: Duration,
) -> anyhow::Result<()> {
    let url = format!("{}{}", gateway_url.trim_end_matches('/'), REGISTER_PATH);
    let body = RegisterBankRequest {
        name: name.clone(),
        address: address.to_string(),
    };

    let resp: ApiResponse<Ack> = http
        .post(&url)
        .timeout(timeout)
        .json(&body)
        .send()
        .await
        .with_context(|| format!("Gateway unreachable at {}", url))?
        .json()
        .await
        .context("Malformed registration response")?;

    resp.into_result()
        .map_err(|(code, msg)| anyhow!("Registration of {} rejected ({}): {}", name, code, msg))?;

    info!(bank = %name, address = %address, "Registered with gateway");
    Ok(())
}
