//! Revert reason extraction from provider errors

use crate::provider::ProviderError;
use alloy::hex;
use alloy::sol_types::decode_revert_reason;
use serde_json::Value;

/// Best-effort human-readable reason for a reverted call
pub fn revert_reason(error: &ProviderError) -> String {
    if let Some(reason) = error.data.as_ref().and_then(reason_from_data) {
        return reason;
    }
    parse_revert_message(&error.message)
}

/// Revert data may be a bare hex string or nested under `data`
fn reason_from_data(data: &Value) -> Option<String> {
    match data {
        Value::String(s) => {
            let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s)).ok()?;
            decode(&bytes)
        }
        Value::Object(map) => map.get("data").and_then(reason_from_data),
        _ => None,
    }
}

fn decode(bytes: &[u8]) -> Option<String> {
    let reason = decode_revert_reason(bytes)?;
    Some(
        reason
            .strip_prefix("revert: ")
            .map(str::to_string)
            .unwrap_or(reason),
    )
}

/// Parse a revert reason out of a node's error message
fn parse_revert_message(message: &str) -> String {
    if message.contains("execution reverted") {
        if let Some(start) = message.find("revert: ") {
            let reason = &message[start + 8..];
            if let Some(end) = reason.find('"') {
                return reason[..end].to_string();
            }
            return reason.to_string();
        }
        let hex_data = message.find("0x").map(|start| hex_run(&message[start..]));
        if let Some(reason) = hex_data
            .and_then(|data| hex::decode(&data[2..]).ok())
            .and_then(|bytes| decode(&bytes))
        {
            return reason;
        }
        if let Some(start) = message.find("execution reverted: ") {
            return message[start + 20..].to_string();
        }
        if let Some(data) = hex_data {
            return format!("Reverted with data: {}", data);
        }
        return "execution reverted".to_string();
    }

    message.to_string()
}

/// `0x` followed by every hex digit up to the first non-hex character
fn hex_run(text: &str) -> &str {
    let end = text[2..]
        .find(|c: char| !c.is_ascii_hexdigit())
        .map(|i| i + 2)
        .unwrap_or(text.len());
    &text[..end]
}
