//! Action audit log
//!
//! Appends one JSON object per line for every user action the orchestrator
//! runs: a `pending` entry when the action starts and a `success` or
//! `error` entry when it completes. Audit failures are logged and never
//! block the action.

use crate::contract::TransactionResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Serialize)]
struct AuditEntry<'a> {
    timestamp: DateTime<Utc>,
    entry_type: &'static str,
    action: &'a str,
    account: Option<String>,
    args: &'a Value,
    transaction_hash: Option<String>,
    error: Option<String>,
    duration_ms: u64,
    status: &'static str,
}

struct AuditLogWriter {
    path: PathBuf,
}

impl AuditLogWriter {
    fn write(&self, entry: &AuditEntry<'_>) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }
}

/// Shared JSONL audit writer
#[derive(Clone)]
pub struct AuditLog {
    writer: Arc<Mutex<AuditLogWriter>>,
}

/// One action being audited
pub struct AuditRecord<'a> {
    pub action: &'a str,
    pub account: Option<alloy::primitives::Address>,
    pub args: Value,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(AuditLogWriter { path: path.into() })),
        }
    }

    pub async fn action_started(&self, record: &AuditRecord<'_>) {
        let entry = AuditEntry {
            timestamp: Utc::now(),
            entry_type: "action_start",
            action: record.action,
            account: record.account.map(|a| a.to_checksum(None)),
            args: &record.args,
            transaction_hash: None,
            error: None,
            duration_ms: 0,
            status: "pending",
        };
        self.write(&entry).await;
    }

    pub async fn action_completed(
        &self,
        record: &AuditRecord<'_>,
        result: std::result::Result<&TransactionResult, &crate::Error>,
        duration_ms: u64,
    ) {
        let (transaction_hash, error, status) = match result {
            Ok(tx) => (Some(tx.transaction_hash.to_string()), None, "success"),
            Err(e) => (None, Some(e.to_string()), "error"),
        };
        let entry = AuditEntry {
            timestamp: Utc::now(),
            entry_type: "action_complete",
            action: record.action,
            account: record.account.map(|a| a.to_checksum(None)),
            args: &record.args,
            transaction_hash,
            error,
            duration_ms,
            status,
        };
        self.write(&entry).await;
    }

    async fn write(&self, entry: &AuditEntry<'_>) {
        let writer = self.writer.lock().await;
        if let Err(e) = writer.write(entry) {
            tracing::warn!(error = %e, "Failed to write audit log entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::TransactionStatus;
    use alloy::primitives::{Address, B256};
    use serde_json::json;

    fn lines(path: &std::path::Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_start_and_success_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let log = AuditLog::new(&path);

        let record = AuditRecord {
            action: "vote",
            account: Some(Address::repeat_byte(0xaa)),
            args: json!({"election_id": 1, "candidate_id": 7}),
        };
        let tx = TransactionResult {
            transaction_hash: B256::repeat_byte(0x11),
            status: TransactionStatus::Confirmed,
            gas_limit: 100_000,
            gas_used: Some(21_000),
            block_number: Some(16),
        };

        log.action_started(&record).await;
        log.action_completed(&record, Ok(&tx), 42).await;

        let entries = lines(&path);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["entry_type"], "action_start");
        assert_eq!(entries[0]["status"], "pending");
        assert_eq!(entries[1]["status"], "success");
        assert_eq!(entries[1]["args"]["candidate_id"], 7);
        assert_eq!(entries[1]["duration_ms"], 42);
        assert_eq!(
            entries[1]["transaction_hash"],
            B256::repeat_byte(0x11).to_string()
        );
    }

    #[tokio::test]
    async fn test_error_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let log = AuditLog::new(&path);

        let record = AuditRecord {
            action: "register_voter",
            account: None,
            args: json!({"age": 17}),
        };
        log.action_completed(
            &record,
            Err(&crate::Error::EstimationFailed("Voter too young".into())),
            3,
        )
        .await;

        let entries = lines(&path);
        assert_eq!(entries[0]["status"], "error");
        assert!(entries[0]["error"]
            .as_str()
            .unwrap()
            .contains("Voter too young"));
        assert!(entries[0]["account"].is_null());
    }

    #[tokio::test]
    async fn test_unwritable_path_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("missing").join("audit.jsonl"));
        let record = AuditRecord {
            action: "vote",
            account: None,
            args: Value::Null,
        };
        log.action_started(&record).await;
    }
}
