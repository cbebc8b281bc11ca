//! Voting dApp client
//!
//! Wallet-session and contract-call orchestration for an on-chain voting
//! application:
//! - Connects to an injected wallet provider and tracks the active account
//! - Checks vote eligibility against the voting contract before submitting
//! - Submits contract writes through gas estimation, then signing
//! - Reports every outcome as render instructions for the page
//!
//! The contract enforces every rule; checks here only spare the user a
//! doomed transaction.

pub mod app;
pub mod audit;
pub mod config;
pub mod contract;
pub mod eligibility;
pub mod orchestrator;
pub mod provider;
pub mod session;
pub mod ui;
pub mod wallet;

mod error;

pub use app::VotingApp;
pub use config::{Config, RpcConfig, PRIVATE_KEY_ENV};
pub use error::{Error, Result};
pub use orchestrator::{ActionOrchestrator, ActionOutcome};
pub use session::{Session, SessionManager};
