//! Wallet session store
//!
//! Holds the single active account and chain. The provider event handlers
//! are the only writers; everything else reads a snapshot or subscribes to
//! changes through the underlying `watch` channel.

use crate::provider::ProviderEvent;
use alloy::primitives::Address;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
    /// Bumped on every account switch and chain reset
    pub epoch: u64,
}

/// What an applied event changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    /// Dependents must resync: re-render the account label and re-check registration
    AccountChanged {
        previous: Option<Address>,
        current: Option<Address>,
    },
    /// Hard reset; all derived state is stale
    Reset { chain_id: u64 },
}

#[derive(Clone)]
pub struct SessionManager {
    state: Arc<watch::Sender<Session>>,
}

impl SessionManager {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Session::default());
        Self {
            state: Arc::new(state),
        }
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn current_account(&self) -> Option<Address> {
        self.state.borrow().account
    }

    pub fn epoch(&self) -> u64 {
        self.state.borrow().epoch
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Record the outcome of an explicit connect
    pub fn set_connected(&self, account: Address, chain_id: Option<u64>) -> SessionChange {
        let mut previous = None;
        self.state.send_modify(|session| {
            previous = session.account;
            if session.account != Some(account) {
                session.epoch += 1;
            }
            session.account = Some(account);
            if chain_id.is_some() {
                session.chain_id = chain_id;
            }
        });
        SessionChange::AccountChanged {
            previous,
            current: Some(account),
        }
    }

    /// Apply a provider notification
    pub fn apply(&self, event: &ProviderEvent) -> SessionChange {
        match event {
            ProviderEvent::AccountsChanged(accounts) => {
                let current = accounts.first().copied();
                let mut previous = None;
                self.state.send_modify(|session| {
                    previous = session.account;
                    if session.account != current {
                        session.epoch += 1;
                    }
                    session.account = current;
                });
                tracing::info!(previous = ?previous, current = ?current, "Account changed");
                SessionChange::AccountChanged { previous, current }
            }
            ProviderEvent::ChainChanged(chain_id) => {
                let chain_id = *chain_id;
                self.state.send_modify(|session| {
                    let epoch = session.epoch + 1;
                    *session = Session {
                        account: None,
                        chain_id: Some(chain_id),
                        epoch,
                    };
                });
                tracing::info!(chain_id, "Chain changed, session reset");
                SessionChange::Reset { chain_id }
            }
        }
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
