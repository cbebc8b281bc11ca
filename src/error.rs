//! Error types for the voting client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No wallet provider detected")]
    ProviderUnavailable,

    #[error("User rejected the request")]
    UserRejected,

    #[error("User rejected the transaction")]
    TransactionRejected,

    #[error("Gas estimation failed: {0}")]
    EstimationFailed(String),

    #[error("Chain error: {0}")]
    ChainError(String),

    #[error("Failed to load voting contract: {0}")]
    ContractLoad(String),

    #[error("No wallet account connected")]
    NotConnected,

    #[error("You are not eligible to vote in this election")]
    NotEligible,

    #[error("Active account changed while the action was in flight")]
    SessionChanged,

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("ABI error: {0}")]
    Abi(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the user may retry the same action unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::UserRejected
                | Error::TransactionRejected
                | Error::ChainError(_)
                | Error::Network(_)
                | Error::SessionChanged
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
