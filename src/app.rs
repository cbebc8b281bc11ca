//! Application shell
//!
//! Loads the contract binding, wires the orchestrator to the provider and
//! the render sink, and runs the provider event loop.

use crate::audit::AuditLog;
use crate::config::Config;
use crate::contract::{ContractBinding, ContractProxy, VotingContract};
use crate::orchestrator::ActionOrchestrator;
use crate::provider::{ProviderEvent, WalletAdapter, WalletProvider};
use crate::session::SessionManager;
use crate::ui::{RenderSink, UiNotifier};
use crate::{Error, Result};
use alloy::primitives::Address;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

pub struct VotingApp {
    orchestrator: Arc<ActionOrchestrator>,
    events: Option<JoinHandle<()>>,
}

impl VotingApp {
    /// Build the app. A missing provider or an unloadable contract is
    /// reported through the sink; the app still starts.
    pub async fn start(
        config: &Config,
        provider: Option<Arc<dyn WalletProvider>>,
        sink: Arc<dyn RenderSink>,
    ) -> Result<Self> {
        config.validate()?;
        let notifier = UiNotifier::new(sink, config.notifications);
        let adapter = WalletAdapter::from_option(provider.clone());

        let mut orchestrator = ActionOrchestrator::new(adapter, SessionManager::new(), notifier)
            .with_expected_chain(config.chain_id);
        if let Some(path) = &config.audit_log_path {
            orchestrator = orchestrator.with_audit(AuditLog::new(path));
        }

        let Some(provider) = provider else {
            orchestrator.report_provider_missing();
            return Ok(Self {
                orchestrator: Arc::new(orchestrator),
                events: None,
            });
        };

        match load_contract(config, provider.clone()).await {
            Ok(contract) => orchestrator = orchestrator.with_contract(contract),
            Err(e) => {
                tracing::error!(error = %e, "Error loading contract");
                orchestrator.notifier().error("Failed to load voting contract");
            }
        }

        let orchestrator = Arc::new(orchestrator);
        let events = spawn_event_loop(orchestrator.clone(), provider.subscribe());
        Ok(Self {
            orchestrator,
            events: Some(events),
        })
    }

    pub fn orchestrator(&self) -> &ActionOrchestrator {
        &self.orchestrator
    }

    /// Stop listening for provider events
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.events.take() {
            handle.abort();
        }
    }
}

impl Drop for VotingApp {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn load_contract(
    config: &Config,
    provider: Arc<dyn WalletProvider>,
) -> Result<VotingContract> {
    let address = Address::from_str(&config.contract.address).map_err(|e| {
        Error::ContractLoad(format!(
            "invalid contract address {}: {}",
            config.contract.address, e
        ))
    })?;
    let binding = ContractBinding::load(address, &config.contract.abi_source).await?;
    let proxy = ContractProxy::new(Arc::new(binding), provider).with_receipt_polling(Some(
        Duration::from_millis(config.receipt_poll_interval_ms),
    ));
    Ok(VotingContract::new(Arc::new(proxy)))
}

fn spawn_event_loop(
    orchestrator: Arc<ActionOrchestrator>,
    mut events: broadcast::Receiver<ProviderEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    tracing::debug!(event = ?event, "Provider event");
                    orchestrator.handle_provider_event(&event).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Provider events dropped");
                }
                Err(RecvError::Closed) => {
                    tracing::debug!("Provider event stream closed");
                    break;
                }
            }
        }
    })
}
