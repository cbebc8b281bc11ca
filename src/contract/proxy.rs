//! Contract proxy
//!
//! Binds a [`ContractBinding`] to a wallet provider. Reads go through
//! `eth_call`; writes are two-phase: `eth_estimateGas` first, so a call
//! that would revert is reported with its reason before the user is asked
//! to sign anything, then `eth_sendTransaction` with the estimated gas.

use super::abi::{is_read_only, ContractBinding};
use super::revert::revert_reason;
use crate::provider::{parse_quantity, WalletProvider};
use crate::{Error, Result};
use alloy::dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy::hex;
use alloy::json_abi::Function;
use alloy::primitives::{Address, B256};
use serde::Serialize;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle state of a submitted transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Accepted by the wallet; receipt not awaited
    Submitted,
    /// Mined with a success status
    Confirmed,
}

/// Outcome of a successful write call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionResult {
    pub transaction_hash: B256,
    pub status: TransactionStatus,
    pub gas_limit: u64,
    pub gas_used: Option<u64>,
    pub block_number: Option<u64>,
}

pub struct ContractProxy {
    binding: Arc<ContractBinding>,
    provider: Arc<dyn WalletProvider>,
    /// `None` returns as soon as the wallet hands back a hash
    receipt_poll_interval: Option<Duration>,
}

impl ContractProxy {
    pub fn new(binding: Arc<ContractBinding>, provider: Arc<dyn WalletProvider>) -> Self {
        Self {
            binding,
            provider,
            receipt_poll_interval: Some(Duration::from_secs(1)),
        }
    }

    pub fn with_receipt_polling(mut self, interval: Option<Duration>) -> Self {
        self.receipt_poll_interval = interval;
        self
    }

    pub fn binding(&self) -> &ContractBinding {
        &self.binding
    }

    /// Call a `view` method. Never mutates chain state.
    pub async fn read_call(&self, method: &str, args: &[DynSolValue]) -> Result<Vec<DynSolValue>> {
        let function = self.binding.function(method, args.len())?;
        if !is_read_only(function) {
            return Err(Error::InvalidArgument(format!(
                "{} is not a view method",
                method
            )));
        }

        let call = json!({
            "to": self.binding.address().to_checksum(None),
            "data": encode_call(function, args)?,
        });

        let raw = self
            .provider
            .request("eth_call", json!([call, "latest"]))
            .await
            .map_err(|e| {
                tracing::debug!(method = %method, error = %e, "eth_call failed");
                Error::ChainError(format!("{} call failed: {}", method, revert_reason(&e)))
            })?;

        let bytes = decode_hex_value(&raw)?;
        function
            .abi_decode_output(&bytes)
            .map_err(|e| Error::Abi(format!("Failed to decode {} output: {}", method, e)))
    }

    /// Estimate, then submit a state-changing method from `from`
    pub async fn write_call(
        &self,
        method: &str,
        args: &[DynSolValue],
        from: Address,
    ) -> Result<TransactionResult> {
        let function = self.binding.function(method, args.len())?;
        if is_read_only(function) {
            return Err(Error::InvalidArgument(format!(
                "{} is a view method and cannot be sent as a transaction",
                method
            )));
        }

        let mut tx = json!({
            "from": from.to_checksum(None),
            "to": self.binding.address().to_checksum(None),
            "data": encode_call(function, args)?,
        });

        let gas_limit = match self
            .provider
            .request("eth_estimateGas", json!([tx.clone()]))
            .await
        {
            Ok(value) => parse_quantity(&value)?,
            Err(e) => {
                let reason = revert_reason(&e);
                tracing::warn!(method = %method, reason = %reason, "Gas estimation failed");
                return Err(Error::EstimationFailed(reason));
            }
        };

        tx["gas"] = json!(format!("{:#x}", gas_limit));
        tracing::debug!(method = %method, gas_limit, "Submitting transaction");

        let hash_value = self
            .provider
            .request("eth_sendTransaction", json!([tx]))
            .await
            .map_err(|e| {
                if e.is_user_rejected() {
                    Error::TransactionRejected
                } else {
                    Error::ChainError(e.message)
                }
            })?;

        let hash_str = hash_value
            .as_str()
            .ok_or_else(|| Error::ChainError(format!("Unexpected transaction hash {}", hash_value)))?;
        let transaction_hash = B256::from_str(hash_str)
            .map_err(|e| Error::ChainError(format!("Invalid transaction hash {}: {}", hash_str, e)))?;

        tracing::info!(method = %method, tx_hash = %transaction_hash, "Transaction submitted");

        let Some(interval) = self.receipt_poll_interval else {
            return Ok(TransactionResult {
                transaction_hash,
                status: TransactionStatus::Submitted,
                gas_limit,
                gas_used: None,
                block_number: None,
            });
        };

        let receipt = self.wait_for_receipt(transaction_hash, interval).await?;
        let status = receipt.get("status").and_then(|v| parse_quantity(v).ok());
        if status == Some(0) {
            return Err(Error::ChainError(format!(
                "transaction {} reverted",
                transaction_hash
            )));
        }

        let result = TransactionResult {
            transaction_hash,
            status: TransactionStatus::Confirmed,
            gas_limit,
            gas_used: receipt.get("gasUsed").and_then(|v| parse_quantity(v).ok()),
            block_number: receipt.get("blockNumber").and_then(|v| parse_quantity(v).ok()),
        };
        tracing::info!(
            method = %method,
            tx_hash = %transaction_hash,
            gas_used = ?result.gas_used,
            "Transaction confirmed"
        );
        Ok(result)
    }

    /// Poll until the node returns a receipt. No overall timeout.
    async fn wait_for_receipt(&self, hash: B256, interval: Duration) -> Result<Value> {
        let hash_hex = hex::encode_prefixed(hash);
        loop {
            let receipt = self
                .provider
                .request("eth_getTransactionReceipt", json!([hash_hex]))
                .await
                .map_err(|e| Error::ChainError(e.message))?;

            if !receipt.is_null() {
                return Ok(receipt);
            }
            tokio::time::sleep(interval).await;
        }
    }
}

fn encode_call(function: &Function, args: &[DynSolValue]) -> Result<String> {
    let data = function
        .abi_encode_input(args)
        .map_err(|e| Error::InvalidArgument(format!("{}: {}", function.name, e)))?;
    Ok(hex::encode_prefixed(data))
}

fn decode_hex_value(value: &Value) -> Result<Vec<u8>> {
    let s = value
        .as_str()
        .ok_or_else(|| Error::ChainError(format!("Expected hex data, got {}", value)))?;
    hex::decode(s.strip_prefix("0x").unwrap_or(s))
        .map_err(|e| Error::ChainError(format!("Invalid hex data: {}", e)))
}
