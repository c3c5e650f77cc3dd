use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

use crate::ledger::LockPolicy;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub bank: BankConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "interbank.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
            gateway: GatewayConfig::default(),
            bank: BankConfig::default(),
            client: ClientConfig::default(),
        }
    }
}

/// Payment gateway (coordinator)
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// User directory for the identity oracle
    pub users_file: String,
    /// HS256 secret bearer tokens are signed with
    pub jwt_secret: String,
    /// Bound on every prepare / commit / release / balance call
    pub rpc_timeout_ms: u64,
    /// How long terminal transaction records are kept for duplicate callers
    pub retention_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            users_file: "sample_data/pg_users.json".to_string(),
            jwt_secret: "interbank-dev-secret".to_string(),
            rpc_timeout_ms: 5_000,
            retention_secs: 3_600,
            sweep_interval_secs: 60,
        }
    }
}

impl GatewayConfig {
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Bank server (participant)
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct BankConfig {
    pub host: String,
    /// 0 binds an ephemeral port
    pub port: u16,
    pub customers_file: String,
    /// Gateway base URL used for the one-time registration
    pub gateway_url: String,
    pub lock_attempts: u32,
    pub lock_backoff_ms: u64,
    /// How long committed / released legs are remembered for duplicates
    pub leg_retention_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            customers_file: "sample_data/bank_customers.json".to_string(),
            gateway_url: "http://127.0.0.1:8080".to_string(),
            lock_attempts: 3,
            lock_backoff_ms: 100,
            leg_retention_secs: 3_600,
            sweep_interval_secs: 60,
        }
    }
}

impl BankConfig {
    pub fn lock_policy(&self) -> LockPolicy {
        LockPolicy {
            attempts: self.lock_attempts,
            backoff_step: Duration::from_millis(self.lock_backoff_ms),
        }
    }

    pub fn leg_retention(&self) -> Duration {
        Duration::from_secs(self.leg_retention_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Interactive client
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ClientConfig {
    pub gateway_url: String,
    /// Bearer token; the `--token` flag overrides it
    pub token: String,
    pub max_attempts: u32,
    pub attempt_timeout_ms: u64,
    pub backoff_step_ms: u64,
    pub offline_interval_secs: u64,
    pub drain_poll_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_url: "http://127.0.0.1:8080".to_string(),
            token: String::new(),
            max_attempts: 5,
            attempt_timeout_ms: 5_000,
            backoff_step_ms: 1_000,
            offline_interval_secs: 15,
            drain_poll_ms: 3_000,
        }
    }
}

impl ClientConfig {
    pub fn offline_interval(&self) -> Duration {
        Duration::from_secs(self.offline_interval_secs)
    }

    pub fn drain_poll(&self) -> Duration {
        Duration::from_millis(self.drain_poll_ms)
    }
}

impl AppConfig {
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse {}", config_path))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_default_when_missing() {
        let yaml = r#"
log_level: debug
log_dir: ./logs
log_file: test.log
use_json: false
rotation: never
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.gateway.rpc_timeout(), Duration::from_secs(5));
        assert_eq!(config.gateway.retention(), Duration::from_secs(3_600));
        assert_eq!(config.bank.lock_policy(), LockPolicy::default());
        assert_eq!(config.bank.leg_retention(), Duration::from_secs(3_600));
        assert_eq!(config.client.max_attempts, 5);
        assert_eq!(config.client.offline_interval_secs, 15);
    }

    #[test]
    fn test_partial_section_overrides() {
        let yaml = r#"
log_level: info
log_dir: ./logs
log_file: test.log
use_json: true
rotation: daily
gateway:
  port: 9000
  rpc_timeout_ms: 250
bank:
  lock_attempts: 5
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.gateway.rpc_timeout(), Duration::from_millis(250));
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert_eq!(config.bank.lock_policy().attempts, 5);
        assert_eq!(config.bank.lock_backoff_ms, 100);
    }

    #[test]
    fn test_dev_config_parses() {
        let content = include_str!("../config/dev.yaml");
        let config = AppConfig::from_yaml(content).unwrap();
        assert_eq!(config.client.drain_poll_ms, 3_000);
    }
}
