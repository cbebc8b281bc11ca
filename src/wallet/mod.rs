//! Local wallet
//!
//! A terminal stand-in for the browser wallet extension. The private key
//! never leaves [`SecureWallet`].

mod local;
mod prompt;
mod signer;

pub use local::LocalWalletProvider;
pub use prompt::{ApprovalPrompt, ApprovalRequest, AutoApprove, ConsolePrompt, RejectAll};
pub use signer::SecureWallet;
