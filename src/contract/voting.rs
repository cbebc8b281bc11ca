//! Typed facade over the voting contract

use super::abi::outputs_to_record;
use super::proxy::{ContractProxy, TransactionResult};
use crate::{Error, Result};
use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, U256};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Candidate registration payload, forwarded verbatim to the contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateApplication {
    pub name: String,
    pub manifesto: String,
    pub age: u64,
    pub email: String,
}

impl CandidateApplication {
    /// Names of required fields that are blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.manifesto.trim().is_empty() {
            missing.push("manifesto");
        }
        if self.age == 0 {
            missing.push("age");
        }
        if self.email.trim().is_empty() {
            missing.push("email");
        }
        missing
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElectionDetails {
    pub id: u64,
    pub fields: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateDetails {
    pub id: u64,
    pub fields: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElectionResult {
    pub candidate: CandidateDetails,
    pub votes: u64,
}

#[derive(Clone)]
pub struct VotingContract {
    proxy: Arc<ContractProxy>,
}

fn uint(value: u64) -> DynSolValue {
    DynSolValue::Uint(U256::from(value), 256)
}

fn expect_bool(method: &str, values: &[DynSolValue]) -> Result<bool> {
    values
        .first()
        .and_then(|v| v.as_bool())
        .ok_or_else(|| Error::Abi(format!("{} did not return a bool", method)))
}

fn expect_uint_array(method: &str, value: Option<&DynSolValue>) -> Result<Vec<u64>> {
    let items = value
        .and_then(|v| v.as_array())
        .ok_or_else(|| Error::Abi(format!("{} did not return an array", method)))?;
    items
        .iter()
        .map(|item| {
            let (value, _) = item
                .as_uint()
                .ok_or_else(|| Error::Abi(format!("{} returned a non-integer element", method)))?;
            u64::try_from(value)
                .map_err(|_| Error::Abi(format!("{} returned {} which exceeds u64", method, value)))
        })
        .collect()
}

impl VotingContract {
    pub fn new(proxy: Arc<ContractProxy>) -> Self {
        Self { proxy }
    }

    pub fn proxy(&self) -> &ContractProxy {
        &self.proxy
    }

    pub async fn registered_voters(&self, account: Address) -> Result<bool> {
        let out = self
            .proxy
            .read_call("registeredVoters", &[DynSolValue::Address(account)])
            .await?;
        expect_bool("registeredVoters", &out)
    }

    pub async fn has_voted(&self, election_id: u64, account: Address) -> Result<bool> {
        let out = self
            .proxy
            .read_call(
                "hasVoted",
                &[uint(election_id), DynSolValue::Address(account)],
            )
            .await?;
        expect_bool("hasVoted", &out)
    }

    pub async fn is_voting_time(&self, election_id: u64) -> Result<bool> {
        let out = self
            .proxy
            .read_call("isVotingTime", &[uint(election_id)])
            .await?;
        expect_bool("isVotingTime", &out)
    }

    pub async fn register_voter(&self, age: u64, from: Address) -> Result<TransactionResult> {
        self.proxy
            .write_call("registerVoter", &[uint(age)], from)
            .await
    }

    pub async fn register_candidate(
        &self,
        application: &CandidateApplication,
        from: Address,
    ) -> Result<TransactionResult> {
        let args = [
            DynSolValue::String(application.name.clone()),
            DynSolValue::String(application.manifesto.clone()),
            uint(application.age),
            DynSolValue::String(application.email.clone()),
        ];
        self.proxy.write_call("registerCandidate", &args, from).await
    }

    pub async fn vote(
        &self,
        election_id: u64,
        candidate_id: u64,
        from: Address,
    ) -> Result<TransactionResult> {
        self.proxy
            .write_call("vote", &[uint(election_id), uint(candidate_id)], from)
            .await
    }

    pub async fn get_election(&self, election_id: u64) -> Result<ElectionDetails> {
        let args = [uint(election_id)];
        let out = self.proxy.read_call("getElection", &args).await?;
        let function = self.proxy.binding().function("getElection", args.len())?;
        Ok(ElectionDetails {
            id: election_id,
            fields: outputs_to_record(function, &out),
        })
    }

    pub async fn get_candidate(&self, candidate_id: u64) -> Result<CandidateDetails> {
        let args = [uint(candidate_id)];
        let out = self.proxy.read_call("getCandidate", &args).await?;
        let function = self.proxy.binding().function("getCandidate", args.len())?;
        Ok(CandidateDetails {
            id: candidate_id,
            fields: outputs_to_record(function, &out),
        })
    }

    /// Approved candidate ids, each resolved to its details
    pub async fn get_approved_candidates(&self) -> Result<Vec<CandidateDetails>> {
        let out = self.proxy.read_call("getApprovedCandidates", &[]).await?;
        let ids = expect_uint_array("getApprovedCandidates", out.first())?;
        try_join_all(ids.into_iter().map(|id| self.get_candidate(id))).await
    }

    /// Vote counts per candidate for an election
    pub async fn get_election_results(&self, election_id: u64) -> Result<Vec<ElectionResult>> {
        let out = self
            .proxy
            .read_call("getElectionResults", &[uint(election_id)])
            .await?;
        let ids = expect_uint_array("getElectionResults", out.first())?;
        let votes = expect_uint_array("getElectionResults", out.get(1))?;
        if ids.len() != votes.len() {
            return Err(Error::Abi(format!(
                "getElectionResults returned {} candidates but {} vote counts",
                ids.len(),
                votes.len()
            )));
        }

        let candidates = try_join_all(ids.into_iter().map(|id| self.get_candidate(id))).await?;
        Ok(candidates
            .into_iter()
            .zip(votes)
            .map(|(candidate, votes)| ElectionResult { candidate, votes })
            .collect())
    }
}
