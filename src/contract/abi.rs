//! Method interface description and contract binding
//!
//! The interface is loaded once, either from a bare JSON ABI array or from
//! a build artifact carrying an `abi` key (Truffle / Hardhat / Foundry).

use crate::{Error, Result};
use alloy::dyn_abi::DynSolValue;
use alloy::hex;
use alloy::json_abi::{Function, JsonAbi, StateMutability};
use alloy::primitives::Address;
use serde_json::{json, Map, Value};

/// Voting contract interface shipped with the crate
pub const BUNDLED_VOTING_ABI: &str = include_str!("../../static/contracts/Voting.json");

/// An address bound to a method interface. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct ContractBinding {
    address: Address,
    abi: JsonAbi,
}

impl ContractBinding {
    pub fn new(address: Address, abi: JsonAbi) -> Self {
        Self { address, abi }
    }

    /// Parse an interface document (bare ABI or artifact)
    pub fn from_json(address: Address, document: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(document)
            .map_err(|e| Error::ContractLoad(format!("Invalid interface document: {}", e)))?;

        let abi_value = match value {
            Value::Object(mut artifact) => artifact
                .remove("abi")
                .ok_or_else(|| Error::ContractLoad("Artifact has no `abi` key".to_string()))?,
            array @ Value::Array(_) => array,
            other => {
                return Err(Error::ContractLoad(format!(
                    "Expected ABI array or artifact object, got {}",
                    other
                )))
            }
        };

        let abi: JsonAbi = serde_json::from_value(abi_value)
            .map_err(|e| Error::ContractLoad(format!("Invalid ABI: {}", e)))?;

        Ok(Self::new(address, abi))
    }

    /// Binding over the bundled voting interface
    pub fn bundled(address: Address) -> Result<Self> {
        Self::from_json(address, BUNDLED_VOTING_ABI)
    }

    /// Load the interface from a file path or an http(s) URL
    pub async fn load(address: Address, source: &str) -> Result<Self> {
        let document = if source.starts_with("http://") || source.starts_with("https://") {
            let url: url::Url = source
                .parse()
                .map_err(|e| Error::ContractLoad(format!("Invalid ABI URL: {}", e)))?;
            reqwest::get(url)
                .await?
                .error_for_status()?
                .text()
                .await?
        } else {
            tokio::fs::read_to_string(source)
                .await
                .map_err(|e| Error::ContractLoad(format!("{}: {}", source, e)))?
        };

        let binding = Self::from_json(address, &document)?;
        tracing::info!(
            address = %address,
            source = %source,
            functions = binding.abi.functions().count(),
            "Contract loaded successfully"
        );
        Ok(binding)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    /// Resolve a method by name, picking the overload with matching arity
    pub fn function(&self, name: &str, arity: usize) -> Result<&Function> {
        let overloads = self
            .abi
            .function(name)
            .ok_or_else(|| Error::InvalidArgument(format!("Unknown contract method: {}", name)))?;

        overloads
            .iter()
            .find(|f| f.inputs.len() == arity)
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "{} does not take {} argument(s)",
                    name, arity
                ))
            })
    }
}

/// `view` and `pure` functions never mutate chain state
pub fn is_read_only(function: &Function) -> bool {
    matches!(
        function.state_mutability,
        StateMutability::View | StateMutability::Pure
    )
}

/// Render a decoded value as JSON. Integers become decimal strings.
pub fn value_to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(b) => json!(b),
        DynSolValue::Uint(u, _) => json!(u.to_string()),
        DynSolValue::Int(i, _) => json!(i.to_string()),
        DynSolValue::Address(a) => json!(a.to_checksum(None)),
        DynSolValue::String(s) => json!(s),
        DynSolValue::Bytes(b) => json!(hex::encode_prefixed(b)),
        DynSolValue::FixedBytes(word, size) => json!(hex::encode_prefixed(&word[..*size])),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            Value::Array(items.iter().map(value_to_json).collect())
        }
        other => json!(format!("{:?}", other)),
    }
}

/// Decoded outputs as a JSON object keyed by output name.
/// Unnamed outputs fall back to their position.
pub fn outputs_to_record(function: &Function, values: &[DynSolValue]) -> Value {
    let mut record = Map::new();
    for (index, value) in values.iter().enumerate() {
        let key = function
            .outputs
            .get(index)
            .map(|p| p.name.as_str())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| index.to_string());
        record.insert(key, value_to_json(value));
    }
    Value::Object(record)
}
