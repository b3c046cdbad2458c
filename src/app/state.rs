//! Application state management.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::domain::{Address, AppError, ChainGateway};
use crate::infra::FlowNetworkConfig;

use super::manage::DomainManager;
use super::session::SessionProvider;

/// Shared application state
pub struct AppState {
    pub session: Arc<SessionProvider>,
    pub gateway: Arc<dyn ChainGateway>,
    pub network: FlowNetworkConfig,
    /// Live management views, keyed by `(owner, name_hash)`
    managers: DashMap<(Address, String), Arc<DomainManager>>,
}

impl AppState {
    #[must_use]
    pub fn new(
        session: Arc<SessionProvider>,
        gateway: Arc<dyn ChainGateway>,
        network: FlowNetworkConfig,
    ) -> Self {
        Self {
            session,
            gateway,
            network,
            managers: DashMap::new(),
        }
    }

    /// Management view for `name_hash`, owned by the logged-in account.
    ///
    /// The same instance is returned while the account stays logged in, so
    /// its mutation lock spans requests. Views of other accounts are dropped.
    pub fn manager_for(&self, name_hash: &str) -> Result<Arc<DomainManager>, AppError> {
        let owner = self.prune_managers().ok_or_else(|| {
            AppError::Authentication("log in to manage domains".to_string())
        })?;

        let manager = self
            .managers
            .entry((owner.clone(), name_hash.to_string()))
            .or_insert_with(|| {
                debug!(owner = %owner, name_hash = %name_hash, "Creating domain manager");
                Arc::new(DomainManager::new(
                    Arc::clone(&self.gateway),
                    self.session.subscribe(),
                    owner.clone(),
                    name_hash,
                ))
            })
            .clone();
        Ok(manager)
    }

    /// Drop every view not owned by the current account. Returns that account.
    pub fn prune_managers(&self) -> Option<Address> {
        let current = self.session.current().addr;
        self.managers
            .retain(|(owner, _), _| Some(owner) == current.as_ref());
        current
    }

    /// Drop a view that has nothing loaded. A view with a write in flight is kept.
    pub fn forget(&self, manager: &DomainManager) {
        let key = (manager.owner().clone(), manager.name_hash().to_string());
        let removed = self
            .managers
            .remove_if(&key, |_, m| !m.is_mutating() && m.domain().is_none());
        if removed.is_some() {
            debug!(owner = %key.0, name_hash = %key.1, "Dropped domain manager");
        }
    }

    pub fn manager_count(&self) -> usize {
        self.managers.len()
    }
}
