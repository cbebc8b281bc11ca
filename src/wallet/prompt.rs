//! User approval for wallet actions
//!
//! Stand-in for the browser wallet's confirmation popup.

use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;
use std::fmt;
use std::io::{BufRead, Write};

/// What the wallet is asking the user to approve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalRequest {
    /// Share the account with the application
    Connect { account: Address },
    /// Sign and broadcast a transaction
    SendTransaction {
        from: Address,
        to: Option<Address>,
        data: Bytes,
        gas: Option<u64>,
    },
}

impl fmt::Display for ApprovalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalRequest::Connect { account } => {
                write!(f, "Connect account {} to the voting app?", account)
            }
            ApprovalRequest::SendTransaction { from, to, data, gas } => {
                write!(f, "Send transaction from {}", from)?;
                if let Some(to) = to {
                    write!(f, " to {}", to)?;
                }
                if data.len() >= 4 {
                    write!(f, " calling 0x{}", alloy::hex::encode(&data[..4]))?;
                }
                if let Some(gas) = gas {
                    write!(f, " (gas limit {})", gas)?;
                }
                write!(f, "?")
            }
        }
    }
}

#[async_trait]
pub trait ApprovalPrompt: Send + Sync {
    async fn approve(&self, request: &ApprovalRequest) -> bool;
}

/// Approves everything (`--yes`)
pub struct AutoApprove;

#[async_trait]
impl ApprovalPrompt for AutoApprove {
    async fn approve(&self, request: &ApprovalRequest) -> bool {
        tracing::debug!(request = %request, "Auto-approved");
        true
    }
}

/// Rejects everything
pub struct RejectAll;

#[async_trait]
impl ApprovalPrompt for RejectAll {
    async fn approve(&self, _request: &ApprovalRequest) -> bool {
        false
    }
}

/// Asks on the terminal; anything but `y`/`yes` rejects
pub struct ConsolePrompt;

#[async_trait]
impl ApprovalPrompt for ConsolePrompt {
    async fn approve(&self, request: &ApprovalRequest) -> bool {
        let question = request.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            let mut stderr = std::io::stderr().lock();
            let _ = write!(stderr, "{} [y/N] ", question);
            let _ = stderr.flush();

            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => is_yes(&line),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Failed to read approval");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Approval prompt task failed");
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
