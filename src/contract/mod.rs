//! Voting contract access
//!
//! - [`ContractBinding`]: address + method interface, loaded once
//! - [`ContractProxy`]: generic read / estimate-then-submit write calls
//! - [`VotingContract`]: typed methods of the voting contract

mod abi;
mod proxy;
mod revert;
mod voting;

pub use abi::{is_read_only, outputs_to_record, value_to_json, ContractBinding, BUNDLED_VOTING_ABI};
pub use proxy::{ContractProxy, TransactionResult, TransactionStatus};
pub use revert::revert_reason;
pub use voting::{
    CandidateApplication, CandidateDetails, ElectionDetails, ElectionResult, VotingContract,
};
