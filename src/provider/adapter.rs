//! Wallet provider adapter
//!
//! Wraps an optional injected provider. A missing provider is a normal
//! state (no wallet extension installed) and surfaces as
//! [`Error::ProviderUnavailable`] from every operation.

use super::{parse_accounts, parse_quantity, ProviderError, ProviderEvent, WalletProvider};
use crate::{Error, Result};
use alloy::primitives::Address;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct WalletAdapter {
    provider: Option<Arc<dyn WalletProvider>>,
}

impl WalletAdapter {
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Adapter for an environment without a wallet
    pub fn unavailable() -> Self {
        Self { provider: None }
    }

    pub fn from_option(provider: Option<Arc<dyn WalletProvider>>) -> Self {
        Self { provider }
    }

    /// The injected provider
    pub fn provider(&self) -> Result<&Arc<dyn WalletProvider>> {
        self.provider.as_ref().ok_or(Error::ProviderUnavailable)
    }

    /// Ask the wallet for account access (triggers the permission prompt)
    pub async fn connect(&self) -> Result<Address> {
        let accounts = self
            .request("eth_requestAccounts", json!([]))
            .await
            .and_then(|v| parse_accounts(&v))?;

        let account = accounts.first().copied().ok_or(Error::UserRejected)?;
        tracing::info!(account = %account, "Wallet connected");
        Ok(account)
    }

    /// Accounts already authorized, without prompting
    pub async fn accounts(&self) -> Result<Vec<Address>> {
        let value = self.request("eth_accounts", json!([])).await?;
        parse_accounts(&value)
    }

    pub async fn chain_id(&self) -> Result<u64> {
        let value = self.request("eth_chainId", json!([])).await?;
        parse_quantity(&value)
    }

    pub fn subscribe(&self) -> Result<broadcast::Receiver<ProviderEvent>> {
        Ok(self.provider()?.subscribe())
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        self.provider()?
            .request(method, params)
            .await
            .map_err(map_request_error)
    }
}

fn map_request_error(err: ProviderError) -> Error {
    if err.is_user_rejected() {
        Error::UserRejected
    } else {
        Error::Provider(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ScriptedProvider;

    #[tokio::test]
    async fn test_connect_without_provider() {
        let adapter = WalletAdapter::unavailable();
        let err = adapter.connect().await.unwrap_err();
        assert!(matches!(err, Error::ProviderUnavailable));
        assert!(adapter.subscribe().is_err());
    }

    #[tokio::test]
    async fn test_connect_returns_first_account() {
        let provider = Arc::new(ScriptedProvider::new());
        let a = Address::repeat_byte(0xaa);
        let b = Address::repeat_byte(0xbb);
        provider.set_accounts(vec![a, b]);

        let adapter = WalletAdapter::new(provider.clone());
        assert_eq!(adapter.connect().await.unwrap(), a);
        assert_eq!(provider.count("eth_requestAccounts"), 1);
    }

    #[tokio::test]
    async fn test_connect_rejected() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.respond("eth_requestAccounts", Err(ProviderError::user_rejected()));

        let adapter = WalletAdapter::new(provider);
        let err = adapter.connect().await.unwrap_err();
        assert!(matches!(err, Error::UserRejected));
    }

    #[tokio::test]
    async fn test_chain_id() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.set_chain_id(11155111);
        let adapter = WalletAdapter::new(provider);
        assert_eq!(adapter.chain_id().await.unwrap(), 11155111);
    }
}
