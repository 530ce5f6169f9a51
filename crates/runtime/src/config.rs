//! Deployment configuration
//!
//! Read from a JSON file; every field has a default, so `{}` deploys
//! the standard GC / mETH / mDAI set with a 10% exchange fee.

use crate::error::RuntimeError;
use crate::transaction::{Call, Transaction};
use gcdex_core::Address;
use gcdex_exchange::ExchangeConfig;
use gcdex_token::TokenConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "GCDEX_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Label of the account that deploys every contract and receives
    /// every initial supply
    #[serde(default = "default_deployer")]
    pub deployer: String,

    /// Tokens, deployed in order
    #[serde(default = "default_tokens")]
    pub tokens: Vec<TokenConfig>,

    /// Label of the account credited with fill fees
    #[serde(default = "default_fee_account")]
    pub fee_account: String,

    #[serde(default = "default_fee_percent")]
    pub fee_percent: u8,
}

fn default_deployer() -> String {
    "deployer".to_string()
}

fn default_tokens() -> Vec<TokenConfig> {
    vec![
        TokenConfig::new("Graham Coin", "GC", 1_000_000),
        TokenConfig::new("mETH", "mETH", 1_000_000),
        TokenConfig::new("mDAI", "mDAI", 1_000_000),
    ]
}

fn default_fee_account() -> String {
    "fee".to_string()
}

fn default_fee_percent() -> u8 {
    10
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            deployer: default_deployer(),
            tokens: default_tokens(),
            fee_account: default_fee_account(),
            fee_percent: default_fee_percent(),
        }
    }
}

impl DeployConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RuntimeError> {
        let path = path.as_ref();
        let invalid = |reason: String| RuntimeError::Config {
            path: path.display().to_string(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))
    }

    /// The file named by `GCDEX_CONFIG`, or the defaults when unset
    pub fn load() -> Result<Self, RuntimeError> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn deployer_address(&self) -> Address {
        Address::from_label(&self.deployer)
    }

    pub fn fee_account_address(&self) -> Address {
        Address::from_label(&self.fee_account)
    }

    /// Deploy every token, then the exchange
    pub fn transactions(&self, timestamp: u64) -> Vec<Transaction> {
        let deployer = self.deployer_address();
        let exchange = ExchangeConfig::new(self.fee_account_address(), self.fee_percent);

        self.tokens
            .iter()
            .map(|config| Call::DeployToken {
                config: config.clone(),
            })
            .chain(std::iter::once(Call::DeployExchange { config: exchange }))
            .map(|call| Transaction::new(deployer, timestamp, call))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = DeployConfig::default();
        let symbols: Vec<&str> = config.tokens.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(symbols, ["GC", "mETH", "mDAI"]);
        assert!(config.tokens.iter().all(|t| t.initial_supply == 1_000_000 && t.decimals == 18));
        assert_eq!(config.fee_percent, 10);
    }

    #[test]
    fn test_config_partial_json() {
        let config: DeployConfig = serde_json::from_str(r#"{ "fee_percent": 3 }"#).unwrap();
        assert_eq!(config.fee_percent, 3);
        assert_eq!(config.tokens.len(), 3);
        assert_eq!(config.deployer, "deployer");
    }

    #[test]
    fn test_from_file() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            r#"{{ "tokens": [{{ "name": "Test", "symbol": "TST", "initial_supply": 5 }}] }}"#
        )?;

        let config = DeployConfig::from_file(file.path())?;
        assert_eq!(config.tokens.len(), 1);
        assert_eq!(config.tokens[0].decimals, 18);

        let txs = config.transactions(0);
        assert_eq!(txs.len(), 2);
        assert!(matches!(txs[1].call, Call::DeployExchange { .. }));
        Ok(())
    }

    #[test]
    fn test_from_file_reports_path() {
        let result = DeployConfig::from_file("/nonexistent/gcdex.json");
        assert!(matches!(result, Err(RuntimeError::Config { path, .. }) if path.contains("gcdex.json")));
    }
}
