//! Local wallet provider
//!
//! A [`WalletProvider`] backed by a local key and a JSON-RPC endpoint,
//! behaving like an injected browser wallet: accounts stay hidden until the
//! user approves `eth_requestAccounts`, every `eth_sendTransaction` asks
//! for approval, and everything else is forwarded to the node.

use super::prompt::{ApprovalPrompt, ApprovalRequest};
use super::SecureWallet;
use crate::provider::{codes, ProviderError, ProviderEvent, WalletProvider};
use crate::{Error, Result};
use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::TransportError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 16;

pub struct LocalWalletProvider {
    address: Address,
    rpc: DynProvider,
    prompt: Arc<dyn ApprovalPrompt>,
    authorized: AtomicBool,
    events: broadcast::Sender<ProviderEvent>,
}

impl LocalWalletProvider {
    pub fn new(wallet: SecureWallet, rpc_url: &str, prompt: Arc<dyn ApprovalPrompt>) -> Result<Self> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e| Error::Config(format!("Invalid RPC URL {}: {}", rpc_url, e)))?;

        let rpc = ProviderBuilder::new()
            .wallet(wallet.wallet().clone())
            .connect_http(url)
            .erased();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            address: wallet.address(),
            rpc,
            prompt,
            authorized: AtomicBool::new(false),
            events,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Withdraw account access, as if the user disconnected the site
    pub fn revoke(&self) {
        if self.authorized.swap(false, Ordering::SeqCst) {
            tracing::info!(account = %self.address, "Wallet access revoked");
            let _ = self.events.send(ProviderEvent::AccountsChanged(Vec::new()));
        }
    }

    fn is_authorized(&self) -> bool {
        self.authorized.load(Ordering::SeqCst)
    }

    fn account_list(&self) -> Value {
        if self.is_authorized() {
            json!([self.address.to_checksum(None)])
        } else {
            json!([])
        }
    }

    async fn request_accounts(&self) -> std::result::Result<Value, ProviderError> {
        if !self.is_authorized() {
            let request = ApprovalRequest::Connect {
                account: self.address,
            };
            if !self.prompt.approve(&request).await {
                return Err(ProviderError::user_rejected());
            }
            self.authorized.store(true, Ordering::SeqCst);
        }
        Ok(self.account_list())
    }

    async fn send_transaction(&self, params: Value) -> std::result::Result<Value, ProviderError> {
        if !self.is_authorized() {
            return Err(ProviderError::unauthorized());
        }

        let raw = params
            .get(0)
            .cloned()
            .ok_or_else(|| ProviderError::new(codes::INTERNAL, "Missing transaction object"))?;
        let tx: TransactionRequest = serde_json::from_value(raw)
            .map_err(|e| ProviderError::new(codes::INTERNAL, format!("Invalid transaction: {}", e)))?;

        if let Some(from) = tx.from {
            if from != self.address {
                return Err(ProviderError::unauthorized());
            }
        }

        let request = ApprovalRequest::SendTransaction {
            from: self.address,
            to: tx.to.and_then(|kind| kind.to().copied()),
            data: tx.input.input().cloned().unwrap_or_default(),
            gas: tx.gas,
        };
        if !self.prompt.approve(&request).await {
            return Err(ProviderError::user_rejected());
        }

        let pending = self
            .rpc
            .send_transaction(tx.from(self.address))
            .await
            .map_err(map_transport_error)?;
        let hash = *pending.tx_hash();
        tracing::info!(tx_hash = %hash, "Transaction broadcast");
        Ok(json!(hash))
    }
}

#[async_trait]
impl WalletProvider for LocalWalletProvider {
    async fn request(&self, method: &str, params: Value) -> std::result::Result<Value, ProviderError> {
        tracing::trace!(method, "Wallet request");
        match method {
            "eth_requestAccounts" => self.request_accounts().await,
            "eth_accounts" => Ok(self.account_list()),
            "eth_sendTransaction" => self.send_transaction(params).await,
            "eth_sign" | "personal_sign" | "eth_signTypedData_v4" => {
                Err(ProviderError::unsupported(method))
            }
            _ => self
                .rpc
                .raw_request::<Value, Value>(method.to_string().into(), params)
                .await
                .map_err(map_transport_error),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

/// Node errors keep their JSON-RPC code and data; transport failures
/// become internal errors
fn map_transport_error(err: TransportError) -> ProviderError {
    match err.as_error_resp() {
        Some(payload) => {
            let error = ProviderError::new(payload.code, payload.message.to_string());
            match payload
                .data
                .as_ref()
                .and_then(|raw| serde_json::from_str::<Value>(raw.get()).ok())
            {
                Some(data) => error.with_data(data),
                None => error,
            }
        }
        None => ProviderError::new(codes::INTERNAL, err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::{AutoApprove, RejectAll};

    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    // Nothing listens here; the tests below never reach the node
    const UNUSED_RPC: &str = "http://127.0.0.1:9";

    fn provider(prompt: Arc<dyn ApprovalPrompt>) -> LocalWalletProvider {
        let wallet = SecureWallet::from_hex(DEV_KEY).unwrap();
        LocalWalletProvider::new(wallet, UNUSED_RPC, prompt).unwrap()
    }

    #[tokio::test]
    async fn test_accounts_hidden_until_approved() {
        let wallet = provider(Arc::new(AutoApprove));
        assert_eq!(
            wallet.request("eth_accounts", json!([])).await.unwrap(),
            json!([])
        );

        let accounts = wallet
            .request("eth_requestAccounts", json!([]))
            .await
            .unwrap();
        assert_eq!(
            accounts,
            json!(["0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"])
        );
        assert_eq!(
            wallet.request("eth_accounts", json!([])).await.unwrap(),
            accounts
        );
    }

    #[tokio::test]
    async fn test_rejected_connect() {
        let wallet = provider(Arc::new(RejectAll));
        let err = wallet
            .request("eth_requestAccounts", json!([]))
            .await
            .unwrap_err();
        assert!(err.is_user_rejected());
    }

    #[tokio::test]
    async fn test_send_requires_authorization() {
        let wallet = provider(Arc::new(AutoApprove));
        let err = wallet
            .request(
                "eth_sendTransaction",
                json!([{ "from": wallet.address(), "to": Address::repeat_byte(0x42) }]),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, codes::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_send_from_other_account_is_refused() {
        let wallet = provider(Arc::new(AutoApprove));
        wallet
            .request("eth_requestAccounts", json!([]))
            .await
            .unwrap();

        let err = wallet
            .request(
                "eth_sendTransaction",
                json!([{ "from": Address::repeat_byte(0x01), "to": Address::repeat_byte(0x42) }]),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, codes::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_revoke_emits_empty_accounts() {
        let wallet = provider(Arc::new(AutoApprove));
        let mut events = wallet.subscribe();
        wallet
            .request("eth_requestAccounts", json!([]))
            .await
            .unwrap();

        wallet.revoke();
        assert_eq!(
            events.recv().await.unwrap(),
            ProviderEvent::AccountsChanged(Vec::new())
        );
        assert_eq!(
            wallet.request("eth_accounts", json!([])).await.unwrap(),
            json!([])
        );
    }

    #[test]
    fn test_invalid_rpc_url() {
        let wallet = SecureWallet::from_hex(DEV_KEY).unwrap();
        assert!(matches!(
            LocalWalletProvider::new(wallet, "not a url", Arc::new(RejectAll)),
            Err(Error::Config(_))
        ));
    }
}
