//! Wallet provider abstraction
//!
//! The provider is the injected wallet capability (EIP-1193 shape): a
//! `request` entry point for JSON-RPC methods and a subscription for
//! `accountsChanged` / `chainChanged` notifications. Everything above this
//! module talks to the wallet through [`WalletProvider`] only, so the
//! browser bridge, the local signer and test doubles are interchangeable.

mod adapter;
pub mod scripted;

pub use adapter::WalletAdapter;
pub use scripted::ScriptedProvider;

use alloy::primitives::Address;
use async_trait::async_trait;
use serde_json::Value;
use std::str::FromStr;
use tokio::sync::broadcast;

/// EIP-1193 / JSON-RPC error codes
pub mod codes {
    /// The user rejected the request
    pub const USER_REJECTED: i64 = 4001;
    /// The requested account has not been authorized
    pub const UNAUTHORIZED: i64 = 4100;
    /// The provider does not support the method
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    /// Execution reverted (geth / anvil)
    pub const EXECUTION_REVERTED: i64 = 3;
    /// Generic internal JSON-RPC error
    pub const INTERNAL: i64 = -32603;
}

/// Notification pushed by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// Active accounts changed; an empty list means access was revoked
    AccountsChanged(Vec<Address>),
    /// The wallet switched networks
    ChainChanged(u64),
}

/// Error returned by a provider request
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} (code {code})")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
    /// Optional payload, e.g. ABI-encoded revert data
    pub data: Option<Value>,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn user_rejected() -> Self {
        Self::new(codes::USER_REJECTED, "User rejected the request.")
    }

    pub fn unauthorized() -> Self {
        Self::new(
            codes::UNAUTHORIZED,
            "The requested account has not been authorized by the user.",
        )
    }

    pub fn unsupported(method: &str) -> Self {
        Self::new(
            codes::UNSUPPORTED_METHOD,
            format!("The provider does not support {}", method),
        )
    }

    pub fn is_user_rejected(&self) -> bool {
        self.code == codes::USER_REJECTED
    }
}

/// Injected wallet capability
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Issue a JSON-RPC request through the wallet
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    /// Subscribe to account and chain notifications
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// Parse a hex quantity (`"0x1a"`) or a plain JSON number
pub fn parse_quantity(value: &Value) -> crate::Result<u64> {
    match value {
        Value::String(s) => {
            let digits = s.strip_prefix("0x").unwrap_or(s);
            u64::from_str_radix(digits, 16)
                .map_err(|e| crate::Error::Provider(format!("Invalid quantity {}: {}", s, e)))
        }
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| crate::Error::Provider(format!("Invalid quantity {}", n))),
        other => Err(crate::Error::Provider(format!(
            "Expected quantity, got {}",
            other
        ))),
    }
}

/// Parse a JSON array of hex addresses
pub fn parse_accounts(value: &Value) -> crate::Result<Vec<Address>> {
    let items = value
        .as_array()
        .ok_or_else(|| crate::Error::Provider(format!("Expected account list, got {}", value)))?;

    items
        .iter()
        .map(|item| {
            let s = item
                .as_str()
                .ok_or_else(|| crate::Error::Provider(format!("Invalid account {}", item)))?;
            Address::from_str(s)
                .map_err(|e| crate::Error::Provider(format!("Invalid account {}: {}", s, e)))
        })
        .collect()
}
