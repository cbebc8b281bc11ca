//! Scripted in-memory provider
//!
//! Answers requests from canned responses and records every request it
//! sees. `eth_call` responses are keyed by function selector so each
//! contract view can be scripted independently. Used by the test suites
//! and by hosts that want to exercise the orchestrator offline.

use super::{codes, ProviderError, ProviderEvent, WalletProvider};
use alloy::dyn_abi::DynSolValue;
use alloy::hex;
use alloy::primitives::{keccak256, Address, B256};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

type Response = Result<Value, ProviderError>;

/// A request observed by the provider
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub params: Value,
}

impl RecordedRequest {
    /// Function selector of the calldata carried by a call or transaction
    pub fn selector(&self) -> Option<[u8; 4]> {
        let data = self.params.get(0)?.get("data")?.as_str()?;
        let bytes = hex::decode(data.strip_prefix("0x").unwrap_or(data)).ok()?;
        bytes.get(..4)?.try_into().ok()
    }
}

pub struct ScriptedProvider {
    responses: Mutex<HashMap<String, Response>>,
    calls: Mutex<HashMap<[u8; 4], Response>>,
    requests: Mutex<Vec<RecordedRequest>>,
    events: broadcast::Sender<ProviderEvent>,
}

/// Selector of a canonical function signature, e.g. `vote(uint256,uint256)`
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

impl ScriptedProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        let provider = Self {
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            events,
        };
        provider.set_chain_id(crate::config::rpc::chains::LOCAL);
        provider.respond("eth_estimateGas", Ok(json!("0x186a0")));
        provider.respond(
            "eth_getTransactionReceipt",
            Ok(json!({ "status": "0x1", "gasUsed": "0x5208", "blockNumber": "0x10" })),
        );
        provider
    }

    /// Set the response for a JSON-RPC method
    pub fn respond(&self, method: &str, response: Response) {
        self.responses
            .lock()
            .unwrap()
            .insert(method.to_string(), response);
    }

    /// Set the decoded return values of a view function
    pub fn respond_view(&self, signature: &str, outputs: Vec<DynSolValue>) {
        let encoded = DynSolValue::Tuple(outputs).abi_encode_params();
        self.calls
            .lock()
            .unwrap()
            .insert(selector(signature), Ok(json!(hex::encode_prefixed(encoded))));
    }

    /// Make a view function fail
    pub fn fail_view(&self, signature: &str, error: ProviderError) {
        self.calls
            .lock()
            .unwrap()
            .insert(selector(signature), Err(error));
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        let list: Vec<String> = accounts.iter().map(|a| a.to_checksum(None)).collect();
        self.respond("eth_requestAccounts", Ok(json!(list)));
        self.respond("eth_accounts", Ok(json!(list)));
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.respond("eth_chainId", Ok(json!(format!("{:#x}", chain_id))));
    }

    /// Accept submitted transactions with the given hash
    pub fn accept_transactions(&self, hash: B256) {
        self.respond(
            "eth_sendTransaction",
            Ok(json!(hex::encode_prefixed(hash))),
        );
    }

    /// Make gas estimation revert with an `Error(string)` reason
    pub fn revert_estimation(&self, reason: &str) {
        let mut data = selector("Error(string)").to_vec();
        let reason = DynSolValue::Tuple(vec![DynSolValue::String(reason.to_string())]);
        data.extend(reason.abi_encode_params());
        self.respond(
            "eth_estimateGas",
            Err(
                ProviderError::new(codes::EXECUTION_REVERTED, "execution reverted")
                    .with_data(json!(hex::encode_prefixed(data))),
            ),
        );
    }

    /// Push a notification to every subscriber
    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests issued for a method
    pub fn count(&self, method: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method)
            .count()
    }

    /// Requests of `method` whose calldata targets `signature`
    pub fn calls_to(&self, method: &str, signature: &str) -> Vec<RecordedRequest> {
        let wanted = selector(signature);
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.selector() == Some(wanted))
            .cloned()
            .collect()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletProvider for ScriptedProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let recorded = RecordedRequest {
            method: method.to_string(),
            params,
        };
        let selector = recorded.selector();
        self.requests.lock().unwrap().push(recorded);

        if method == "eth_call" {
            let scripted = selector.and_then(|s| self.calls.lock().unwrap().get(&s).cloned());
            return scripted.unwrap_or_else(|| {
                Err(ProviderError::new(
                    codes::EXECUTION_REVERTED,
                    "execution reverted",
                ))
            });
        }

        self.responses
            .lock()
            .unwrap()
            .get(method)
            .cloned()
            .unwrap_or_else(|| Err(ProviderError::unsupported(method)))
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}
