//! Configuration for the voting client

pub mod rpc;

use serde::{Deserialize, Serialize};
use std::path::Path;

pub use rpc::RpcConfig;

/// Environment variable holding the wallet's private key
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

/// Environment variable overriding the contract address
pub const CONTRACT_ADDRESS_ENV: &str = "VOTING_CONTRACT_ADDRESS";

/// Where and how the voting contract is bound
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractConfig {
    /// Deployed contract address (hex, 0x-prefixed)
    pub address: String,
    /// Method interface description: a file path or an http(s) URL
    pub abi_source: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            address: std::env::var(CONTRACT_ADDRESS_ENV)
                .unwrap_or_else(|_| "0x0000000000000000000000000000000000000000".to_string()),
            abi_source: "static/contracts/Voting.json".to_string(),
        }
    }
}

/// Banner timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Delay before a transient banner starts fading out
    pub dismiss_after_ms: u64,
    /// Length of the fade-out before the banner is removed
    pub fade_out_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            dismiss_after_ms: 5_000,
            fade_out_ms: 300,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Voting contract binding
    pub contract: ContractConfig,
    /// Network the contract is deployed on
    pub chain_id: u64,
    /// Banner timing
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// Interval between receipt polls after submission (milliseconds)
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,
    /// Path to the transaction audit log (JSONL)
    #[serde(default)]
    pub audit_log_path: Option<String>,
}

fn default_receipt_poll_interval_ms() -> u64 {
    1_000
}

impl Config {
    /// Load a JSON configuration file
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| crate::Error::Config(e.to_string()))?;
        let config: Self =
            serde_json::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.receipt_poll_interval_ms == 0 {
            return Err(crate::Error::Config(
                "receipt_poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            contract: ContractConfig::default(),
            chain_id: rpc::chains::SEPOLIA,
            notifications: NotificationConfig::default(),
            receipt_poll_interval_ms: default_receipt_poll_interval_ms(),
            audit_log_path: Some("votes_audit.jsonl".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_applies_defaults() {
        let value = serde_json::json!({
            "contract": {
                "address": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
                "abi_source": "Voting.json"
            },
            "chain_id": 31337
        });
        let parsed: Config = serde_json::from_value(value).expect("parse config");
        assert_eq!(parsed.notifications, NotificationConfig::default());
        assert_eq!(parsed.receipt_poll_interval_ms, 1_000);
        assert!(parsed.audit_log_path.is_none());
    }

    #[test]
    fn deserialize_explicit_timing() {
        let value = serde_json::json!({
            "contract": {
                "address": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
                "abi_source": "https://example.org/Voting.json"
            },
            "chain_id": 11155111,
            "notifications": { "dismiss_after_ms": 2000, "fade_out_ms": 100 },
            "receipt_poll_interval_ms": 250,
            "audit_log_path": "audit.jsonl"
        });
        let parsed: Config = serde_json::from_value(value).expect("parse config");
        assert_eq!(parsed.notifications.dismiss_after_ms, 2000);
        assert_eq!(parsed.notifications.fade_out_ms, 100);
        assert_eq!(parsed.receipt_poll_interval_ms, 250);
        assert_eq!(parsed.audit_log_path.as_deref(), Some("audit.jsonl"));
    }

    #[test]
    fn from_file_reports_missing_file() {
        let err = Config::from_file(Path::new("/nonexistent/voting.json")).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn from_file_rejects_zero_poll_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voting.json");
        std::fs::write(
            &path,
            r#"{
                "contract": { "address": "0x5FbDB2315678afecb367f032d93F642f64180aa3", "abi_source": "Voting.json" },
                "chain_id": 31337,
                "receipt_poll_interval_ms": 0
            }"#,
        )
        .unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("receipt_poll_interval_ms"));
        assert!(Config::default().validate().is_ok());
    }
}
