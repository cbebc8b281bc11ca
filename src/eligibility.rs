//! Vote eligibility check
//!
//! Advisory only: the contract enforces eligibility atomically when the
//! vote is mined. Verdicts are never cached; registration and the voting
//! window can change between any two checks.

use crate::contract::VotingContract;
use crate::session::SessionManager;
use crate::{Error, Result};
use alloy::primitives::Address;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EligibilityVerdict {
    pub account: Address,
    pub election_id: u64,
    pub is_registered: bool,
    pub has_voted: bool,
    pub is_voting_open: bool,
    /// Session epoch the verdict was computed in
    pub epoch: u64,
}

impl EligibilityVerdict {
    pub fn is_eligible(&self) -> bool {
        self.is_registered && !self.has_voted && self.is_voting_open
    }

    /// First failing condition, for user-facing messages
    pub fn reason(&self) -> Option<&'static str> {
        if !self.is_registered {
            Some("account is not registered as a voter")
        } else if self.has_voted {
            Some("account has already voted in this election")
        } else if !self.is_voting_open {
            Some("voting is not open for this election")
        } else {
            None
        }
    }
}

#[derive(Clone)]
pub struct EligibilityChecker {
    contract: VotingContract,
    session: SessionManager,
}

impl EligibilityChecker {
    pub fn new(contract: VotingContract, session: SessionManager) -> Self {
        Self { contract, session }
    }

    /// Run the three status reads concurrently for the current account
    pub async fn verdict(&self, election_id: u64) -> Result<EligibilityVerdict> {
        let session = self.session.snapshot();
        let account = session.account.ok_or(Error::NotConnected)?;

        let (is_registered, has_voted, is_voting_open) = futures::try_join!(
            self.contract.registered_voters(account),
            self.contract.has_voted(election_id, account),
            self.contract.is_voting_time(election_id)
        )?;

        let verdict = EligibilityVerdict {
            account,
            election_id,
            is_registered,
            has_voted,
            is_voting_open,
            epoch: session.epoch,
        };
        tracing::debug!(
            account = %account,
            election_id,
            is_registered,
            has_voted,
            is_voting_open,
            "Eligibility verdict"
        );
        Ok(verdict)
    }

    /// `false` on any failure
    pub async fn can_vote(&self, election_id: u64) -> bool {
        match self.verdict(election_id).await {
            Ok(verdict) => verdict.is_eligible(),
            Err(e) => {
                tracing::warn!(election_id, error = %e, "Error checking voting eligibility");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{ContractBinding, ContractProxy};
    use crate::provider::{ProviderError, ScriptedProvider};
    use alloy::dyn_abi::DynSolValue;
    use std::sync::Arc;

    fn checker(
        provider: Arc<ScriptedProvider>,
        registered: bool,
        voted: bool,
        open: bool,
    ) -> (EligibilityChecker, SessionManager) {
        provider.respond_view(
            "registeredVoters(address)",
            vec![DynSolValue::Bool(registered)],
        );
        provider.respond_view("hasVoted(uint256,address)", vec![DynSolValue::Bool(voted)]);
        provider.respond_view("isVotingTime(uint256)", vec![DynSolValue::Bool(open)]);

        let binding = ContractBinding::bundled(Address::repeat_byte(0x42)).unwrap();
        let contract =
            VotingContract::new(Arc::new(ContractProxy::new(Arc::new(binding), provider)));
        let session = SessionManager::new();
        (EligibilityChecker::new(contract, session.clone()), session)
    }

    #[tokio::test]
    async fn test_only_all_three_conditions_pass() {
        for registered in [false, true] {
            for voted in [false, true] {
                for open in [false, true] {
                    let provider = Arc::new(ScriptedProvider::new());
                    let (checker, session) = checker(provider, registered, voted, open);
                    session.set_connected(Address::repeat_byte(0xaa), None);

                    let expected = registered && !voted && open;
                    assert_eq!(
                        checker.can_vote(1).await,
                        expected,
                        "registered={} voted={} open={}",
                        registered,
                        voted,
                        open
                    );
                }
            }
        }
    }

    #[tokio::test]
    async fn test_issues_three_reads_per_check() {
        let provider = Arc::new(ScriptedProvider::new());
        let (checker, session) = checker(provider.clone(), true, false, true);
        session.set_connected(Address::repeat_byte(0xaa), None);

        assert!(checker.can_vote(1).await);
        assert!(checker.can_vote(1).await);
        assert_eq!(provider.count("eth_call"), 6);
    }

    #[tokio::test]
    async fn test_not_connected() {
        let provider = Arc::new(ScriptedProvider::new());
        let (checker, _session) = checker(provider.clone(), true, false, true);

        assert!(matches!(
            checker.verdict(1).await.unwrap_err(),
            Error::NotConnected
        ));
        assert!(!checker.can_vote(1).await);
        assert_eq!(provider.count("eth_call"), 0);
    }

    #[tokio::test]
    async fn test_read_failure_is_ineligible() {
        let provider = Arc::new(ScriptedProvider::new());
        let (checker, session) = checker(provider.clone(), true, false, true);
        provider.fail_view(
            "isVotingTime(uint256)",
            ProviderError::new(-32000, "header not found"),
        );
        session.set_connected(Address::repeat_byte(0xaa), None);

        assert!(!checker.can_vote(1).await);
    }

    #[test]
    fn test_reason_reports_first_failure() {
        let verdict = EligibilityVerdict {
            account: Address::ZERO,
            election_id: 1,
            is_registered: true,
            has_voted: true,
            is_voting_open: false,
            epoch: 0,
        };
        assert_eq!(
            verdict.reason(),
            Some("account has already voted in this election")
        );
    }
}
