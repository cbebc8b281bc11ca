//! User-facing actions
//!
//! Each action runs validate, then (for votes) an eligibility check, then
//! the two-phase contract write, and reports through the notifier: a
//! success banner plus the entity-specific page update, or a failure
//! banner and no other UI change. Errors stop here and come back as an
//! [`ActionOutcome`].

use crate::audit::{AuditLog, AuditRecord};
use crate::contract::{CandidateApplication, TransactionResult, VotingContract};
use crate::eligibility::EligibilityChecker;
use crate::provider::{ProviderEvent, WalletAdapter};
use crate::session::{SessionChange, SessionManager};
use crate::ui::{render, RenderInstruction, Severity, UiNotifier};
use crate::{Error, Result};
use alloy::primitives::Address;
use serde_json::json;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

pub const CONNECT_PROMPT: &str = "Please connect MetaMask to continue";

/// Result of one user action
#[derive(Debug)]
pub enum ActionOutcome {
    Connected(Address),
    Submitted(TransactionResult),
    Failed(Error),
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, ActionOutcome::Failed(_))
    }

    pub fn transaction(&self) -> Option<&TransactionResult> {
        match self {
            ActionOutcome::Submitted(tx) => Some(tx),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            ActionOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Text shown after "... failed: "
fn failure_reason(error: &Error) -> String {
    match error {
        Error::EstimationFailed(reason) | Error::ChainError(reason) => reason.clone(),
        other => other.to_string(),
    }
}

pub struct ActionOrchestrator {
    adapter: WalletAdapter,
    session: SessionManager,
    contract: Option<VotingContract>,
    notifier: UiNotifier,
    audit: Option<AuditLog>,
    expected_chain: Option<u64>,
    provider_notice_shown: AtomicBool,
}

impl ActionOrchestrator {
    pub fn new(adapter: WalletAdapter, session: SessionManager, notifier: UiNotifier) -> Self {
        Self {
            adapter,
            session,
            contract: None,
            notifier,
            audit: None,
            expected_chain: None,
            provider_notice_shown: AtomicBool::new(false),
        }
    }

    pub fn with_contract(mut self, contract: VotingContract) -> Self {
        self.contract = Some(contract);
        self
    }

    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Warn on connect when the wallet is on another network
    pub fn with_expected_chain(mut self, chain_id: u64) -> Self {
        self.expected_chain = Some(chain_id);
        self
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn notifier(&self) -> &UiNotifier {
        &self.notifier
    }

    pub fn contract(&self) -> Result<&VotingContract> {
        self.contract
            .as_ref()
            .ok_or_else(|| Error::ContractLoad("voting contract is not loaded".to_string()))
    }

    pub fn eligibility(&self) -> Result<EligibilityChecker> {
        Ok(EligibilityChecker::new(
            self.contract()?.clone(),
            self.session.clone(),
        ))
    }

    /// Show the install banner the first time the wallet is found missing
    pub fn report_provider_missing(&self) {
        if !self.provider_notice_shown.swap(true, Ordering::SeqCst) {
            self.notifier
                .notify_persistent(Severity::Warning, render::provider_missing_html());
        }
    }

    pub async fn connect_wallet(&self) -> ActionOutcome {
        match self.try_connect().await {
            Ok(account) => ActionOutcome::Connected(account),
            Err(Error::ProviderUnavailable) => {
                self.report_provider_missing();
                ActionOutcome::Failed(Error::ProviderUnavailable)
            }
            Err(e) => {
                tracing::warn!(error = %e, "User denied account access");
                self.notifier.error(CONNECT_PROMPT);
                ActionOutcome::Failed(e)
            }
        }
    }

    async fn try_connect(&self) -> Result<Address> {
        let account = self.adapter.connect().await?;

        let chain_id = match self.adapter.chain_id().await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::debug!(error = %e, "Could not read chain id");
                None
            }
        };
        if let (Some(expected), Some(actual)) = (self.expected_chain, chain_id) {
            if expected != actual {
                tracing::warn!(expected, actual, "Wallet is on an unexpected network");
                self.notifier.warning(&format!(
                    "Wallet is connected to chain {} but the voting contract is on chain {}",
                    actual, expected
                ));
            }
        }

        self.session.set_connected(account, chain_id);
        self.resync(account).await;
        Ok(account)
    }

    /// Re-render the account and re-check its registration.
    /// The prompt appears only when the contract reports "not registered".
    async fn resync(&self, account: Address) {
        self.notifier.render_all(render::account_connected(&account));
        match self.check_registration(account).await {
            Ok(true) => {}
            Ok(false) => {
                self.notifier
                    .notify_html(Severity::Info, render::registration_prompt_html());
            }
            Err(e) => {
                tracing::warn!(account = %account, error = %e, "Error checking registration");
            }
        }
    }

    pub async fn check_registration(&self, account: Address) -> Result<bool> {
        let registered = self.contract()?.registered_voters(account).await?;
        tracing::debug!(account = %account, registered, "Registration checked");
        Ok(registered)
    }

    pub async fn register_voter(&self, age: i64) -> ActionOutcome {
        let outcome = self
            .audited("register_voter", json!({ "age": age }), async {
                if age <= 0 {
                    return Err(Error::InvalidArgument(
                        "age must be a positive integer".to_string(),
                    ));
                }
                let from = self.require_account()?;
                self.contract()?.register_voter(age as u64, from).await
            })
            .await;

        match outcome {
            Ok(tx) => {
                self.notifier.success("Voter registration successful!");
                ActionOutcome::Submitted(tx)
            }
            Err(e) => self.fail("Voter registration failed", e),
        }
    }

    pub async fn register_candidate(&self, application: CandidateApplication) -> ActionOutcome {
        let args = serde_json::to_value(&application).unwrap_or_default();
        let outcome = self
            .audited("register_candidate", args, async {
                let missing = application.missing_fields();
                if !missing.is_empty() {
                    return Err(Error::InvalidArgument(format!(
                        "missing {}",
                        missing.join(", ")
                    )));
                }
                let from = self.require_account()?;
                self.contract()?.register_candidate(&application, from).await
            })
            .await;

        match outcome {
            Ok(tx) => {
                self.notifier
                    .success("Candidate registration submitted! Waiting for admin approval.");
                ActionOutcome::Submitted(tx)
            }
            Err(e) => self.fail("Candidate registration failed", e),
        }
    }

    pub async fn cast_vote(&self, election_id: u64, candidate_id: u64) -> ActionOutcome {
        if self.session.current_account().is_none() {
            if let ActionOutcome::Failed(e) = self.connect_wallet().await {
                return ActionOutcome::Failed(e);
            }
        }

        let args = json!({ "election_id": election_id, "candidate_id": candidate_id });
        let outcome = self
            .audited("vote", args, self.vote_if_eligible(election_id, candidate_id))
            .await;

        match outcome {
            Ok(tx) => {
                self.notifier.success(&format!(
                    "Vote cast successfully! Transaction: {}",
                    tx.transaction_hash
                ));
                self.notifier.render(render::mark_voted(candidate_id));
                ActionOutcome::Submitted(tx)
            }
            Err(e) => self.fail("Vote failed", e),
        }
    }

    async fn vote_if_eligible(
        &self,
        election_id: u64,
        candidate_id: u64,
    ) -> Result<TransactionResult> {
        let contract = self.contract()?;
        let verdict = match self.eligibility()?.verdict(election_id).await {
            Ok(verdict) => verdict,
            Err(Error::NotConnected) => return Err(Error::NotConnected),
            Err(e) => {
                tracing::warn!(election_id, error = %e, "Error checking voting eligibility");
                return Err(Error::NotEligible);
            }
        };
        if !verdict.is_eligible() {
            tracing::info!(
                account = %verdict.account,
                election_id,
                reason = verdict.reason().unwrap_or_default(),
                "Vote refused before submission"
            );
            return Err(Error::NotEligible);
        }
        if self.session.epoch() != verdict.epoch {
            return Err(Error::SessionChanged);
        }

        contract.vote(election_id, candidate_id, verdict.account).await
    }

    /// React to a wallet notification
    pub async fn handle_provider_event(&self, event: &ProviderEvent) {
        match self.session.apply(event) {
            SessionChange::AccountChanged { current, .. } => {
                self.notifier.render(RenderInstruction::ClearEligibility);
                match current {
                    Some(account) => self.resync(account).await,
                    None => self.notifier.render_all(render::account_disconnected()),
                }
            }
            SessionChange::Reset { .. } => {
                self.notifier.render(RenderInstruction::Reload);
            }
        }
    }

    fn require_account(&self) -> Result<Address> {
        self.session.current_account().ok_or(Error::NotConnected)
    }

    fn fail(&self, prefix: &str, error: Error) -> ActionOutcome {
        if matches!(error, Error::ProviderUnavailable) {
            self.report_provider_missing();
        } else {
            tracing::warn!(error = %error, retryable = error.is_retryable(), "{}", prefix);
            self.notifier
                .error(&format!("{}: {}", prefix, failure_reason(&error)));
        }
        ActionOutcome::Failed(error)
    }

    async fn audited<F>(
        &self,
        action: &str,
        args: serde_json::Value,
        run: F,
    ) -> Result<TransactionResult>
    where
        F: Future<Output = Result<TransactionResult>>,
    {
        let record = AuditRecord {
            action,
            account: self.session.current_account(),
            args,
        };
        if let Some(audit) = &self.audit {
            audit.action_started(&record).await;
        }

        let started = Instant::now();
        let result = run.await;

        if let Some(audit) = &self.audit {
            audit
                .action_completed(
                    &record,
                    result.as_ref(),
                    started.elapsed().as_millis() as u64,
                )
                .await;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotificationConfig;
    use crate::contract::{ContractBinding, ContractProxy};
    use crate::provider::ScriptedProvider;
    use crate::ui::RecordingSink;
    use alloy::dyn_abi::DynSolValue;
    use alloy::primitives::B256;
    use std::sync::Arc;

    struct Harness {
        provider: Arc<ScriptedProvider>,
        sink: Arc<RecordingSink>,
        orchestrator: ActionOrchestrator,
    }

    fn account() -> Address {
        Address::repeat_byte(0xaa)
    }

    fn harness() -> Harness {
        let provider = Arc::new(ScriptedProvider::new());
        provider.set_accounts(vec![account()]);
        provider.accept_transactions(B256::repeat_byte(0x11));
        provider.respond_view("registeredVoters(address)", vec![DynSolValue::Bool(true)]);
        provider.respond_view("hasVoted(uint256,address)", vec![DynSolValue::Bool(false)]);
        provider.respond_view("isVotingTime(uint256)", vec![DynSolValue::Bool(true)]);

        let binding = ContractBinding::bundled(Address::repeat_byte(0x42)).unwrap();
        let proxy = ContractProxy::new(Arc::new(binding), provider.clone())
            .with_receipt_polling(None);
        let sink = Arc::new(RecordingSink::new());
        let notifier = UiNotifier::new(sink.clone(), NotificationConfig::default());

        let orchestrator = ActionOrchestrator::new(
            WalletAdapter::new(provider.clone()),
            SessionManager::new(),
            notifier,
        )
        .with_contract(VotingContract::new(Arc::new(proxy)));

        Harness {
            provider,
            sink,
            orchestrator,
        }
    }

    fn has_alert(sink: &RecordingSink, text: &str) -> bool {
        sink.alerts().iter().any(|html| html.contains(text))
    }

    #[tokio::test]
    async fn test_connect_renders_account() {
        let h = harness();
        let outcome = h.orchestrator.connect_wallet().await;

        assert!(matches!(outcome, ActionOutcome::Connected(a) if a == account()));
        assert_eq!(h.orchestrator.session().current_account(), Some(account()));
        assert!(h
            .sink
            .instructions()
            .iter()
            .any(|i| matches!(i, RenderInstruction::SetVisible { visible: true, .. })));
        assert!(h.sink.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_connect_unregistered_shows_prompt() {
        let h = harness();
        h.provider
            .respond_view("registeredVoters(address)", vec![DynSolValue::Bool(false)]);

        h.orchestrator.connect_wallet().await;
        assert!(has_alert(&h.sink, "Complete Your Registration"));
    }

    #[tokio::test]
    async fn test_unknown_registration_shows_no_prompt() {
        let h = harness();
        h.provider.fail_view(
            "registeredVoters(address)",
            crate::provider::ProviderError::new(-32000, "header not found"),
        );

        let outcome = h.orchestrator.connect_wallet().await;
        assert!(outcome.is_success());
        assert!(!has_alert(&h.sink, "Complete Your Registration"));
        assert!(h.sink.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_unloaded_contract_shows_no_prompt() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.set_accounts(vec![account()]);
        let sink = Arc::new(RecordingSink::new());
        let orchestrator = ActionOrchestrator::new(
            WalletAdapter::new(provider),
            SessionManager::new(),
            UiNotifier::new(sink.clone(), NotificationConfig::default()),
        );

        orchestrator.connect_wallet().await;
        assert!(matches!(
            orchestrator.check_registration(account()).await,
            Err(Error::ContractLoad(_))
        ));
        assert!(!has_alert(&sink, "Complete Your Registration"));
    }

    #[tokio::test]
    async fn test_connect_rejected() {
        let h = harness();
        h.provider.respond(
            "eth_requestAccounts",
            Err(crate::provider::ProviderError::user_rejected()),
        );

        let outcome = h.orchestrator.connect_wallet().await;
        assert!(matches!(outcome.error(), Some(Error::UserRejected)));
        assert!(has_alert(&h.sink, CONNECT_PROMPT));
    }

    #[tokio::test]
    async fn test_chain_mismatch_warns() {
        let h = harness();
        let orchestrator = h.orchestrator.with_expected_chain(11_155_111);

        orchestrator.connect_wallet().await;
        assert!(has_alert(&h.sink, "but the voting contract is on chain 11155111"));
    }

    #[tokio::test]
    async fn test_missing_provider_banner_shown_once() {
        let sink = Arc::new(RecordingSink::new());
        let orchestrator = ActionOrchestrator::new(
            WalletAdapter::unavailable(),
            SessionManager::new(),
            UiNotifier::new(sink.clone(), NotificationConfig::default()),
        );

        orchestrator.connect_wallet().await;
        orchestrator.cast_vote(1, 7).await;

        assert_eq!(sink.alerts().len(), 1);
        assert!(has_alert(&sink, "MetaMask Required"));
    }

    #[tokio::test]
    async fn test_register_voter_rejects_non_positive_age() {
        let h = harness();
        h.orchestrator.connect_wallet().await;

        let outcome = h.orchestrator.register_voter(0).await;
        assert!(matches!(outcome.error(), Some(Error::InvalidArgument(_))));
        assert_eq!(h.provider.count("eth_estimateGas"), 0);
        assert!(has_alert(&h.sink, "Voter registration failed: "));
    }

    #[tokio::test]
    async fn test_register_voter_revert_reason_in_banner() {
        let h = harness();
        h.orchestrator.connect_wallet().await;
        h.provider.revert_estimation("Voter too young");

        let outcome = h.orchestrator.register_voter(16).await;
        assert!(matches!(outcome.error(), Some(Error::EstimationFailed(_))));
        assert!(has_alert(&h.sink, "Voter registration failed: Voter too young"));
        assert_eq!(h.provider.count("eth_sendTransaction"), 0);
    }

    #[tokio::test]
    async fn test_register_voter_success() {
        let h = harness();
        h.orchestrator.connect_wallet().await;

        let outcome = h.orchestrator.register_voter(30).await;
        assert!(outcome.is_success());
        assert!(has_alert(&h.sink, "Voter registration successful!"));
        assert_eq!(
            h.provider
                .calls_to("eth_sendTransaction", "registerVoter(uint256)")
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_register_candidate_checks_presence() {
        let h = harness();
        h.orchestrator.connect_wallet().await;

        let outcome = h
            .orchestrator
            .register_candidate(CandidateApplication {
                name: "Ada".into(),
                manifesto: " ".into(),
                age: 36,
                email: "ada@example.com".into(),
            })
            .await;
        assert!(!outcome.is_success());
        assert!(has_alert(&h.sink, "Candidate registration failed: "));
        assert_eq!(h.provider.count("eth_estimateGas"), 0);
    }

    #[tokio::test]
    async fn test_register_candidate_success() {
        let h = harness();
        h.orchestrator.connect_wallet().await;

        let outcome = h
            .orchestrator
            .register_candidate(CandidateApplication {
                name: "Ada".into(),
                manifesto: "Analytical engines for all".into(),
                age: 36,
                email: "ada@example.com".into(),
            })
            .await;
        assert!(outcome.is_success());
        assert!(has_alert(
            &h.sink,
            "Candidate registration submitted! Waiting for admin approval."
        ));
    }

    #[tokio::test]
    async fn test_vote_connects_first_and_marks_card() {
        let h = harness();

        let outcome = h.orchestrator.cast_vote(1, 7).await;
        assert!(outcome.is_success());
        assert_eq!(h.provider.count("eth_requestAccounts"), 1);
        assert!(h
            .sink
            .instructions()
            .contains(&render::mark_voted(7)));
    }

    #[tokio::test]
    async fn test_ineligible_vote_never_estimates() {
        let h = harness();
        h.provider
            .respond_view("isVotingTime(uint256)", vec![DynSolValue::Bool(false)]);
        h.orchestrator.connect_wallet().await;

        let outcome = h.orchestrator.cast_vote(1, 7).await;
        assert!(matches!(outcome.error(), Some(Error::NotEligible)));
        assert_eq!(h.provider.count("eth_estimateGas"), 0);
        assert!(has_alert(
            &h.sink,
            "Vote failed: You are not eligible to vote in this election"
        ));
    }

    #[tokio::test]
    async fn test_user_rejects_signing() {
        let h = harness();
        h.orchestrator.connect_wallet().await;
        h.provider.respond(
            "eth_sendTransaction",
            Err(crate::provider::ProviderError::user_rejected()),
        );

        let outcome = h.orchestrator.cast_vote(1, 7).await;
        assert!(matches!(outcome.error(), Some(Error::TransactionRejected)));
        assert!(!h
            .sink
            .instructions()
            .iter()
            .any(|i| matches!(i, RenderInstruction::MarkVoted { .. })));
    }

    #[tokio::test]
    async fn test_chain_change_resets() {
        let h = harness();
        h.orchestrator.connect_wallet().await;

        h.orchestrator
            .handle_provider_event(&ProviderEvent::ChainChanged(1))
            .await;
        assert_eq!(h.orchestrator.session().current_account(), None);
        assert_eq!(
            h.sink.instructions().last(),
            Some(&RenderInstruction::Reload)
        );
    }

    #[tokio::test]
    async fn test_accounts_revoked_renders_disconnected() {
        let h = harness();
        h.orchestrator.connect_wallet().await;

        h.orchestrator
            .handle_provider_event(&ProviderEvent::AccountsChanged(Vec::new()))
            .await;
        assert!(h.sink.instructions().contains(&RenderInstruction::SetText {
            target: crate::ui::selectors::USER_ACCOUNT.to_string(),
            text: "Not connected".to_string(),
            title: None,
        }));
    }

    #[tokio::test]
    async fn test_audit_entries_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let h = harness();
        let orchestrator = h.orchestrator.with_audit(AuditLog::new(&path));
        orchestrator.connect_wallet().await;

        orchestrator.cast_vote(1, 7).await;
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("\"action\":\"vote\""));
        assert!(content.contains("\"status\":\"success\""));
    }
}
