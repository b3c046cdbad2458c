//! Domain traits defining contracts for external systems.

use async_trait::async_trait;
use tokio::sync::watch;

use super::error::AppError;
use super::types::{Address, DomainInfo, Session, TransactionRequest};

/// Chain gateway: read-only scripts and state-changing transactions against
/// the FNS contracts.
///
/// Writes return a transaction id. A write only counts as done once
/// [`ChainGateway::wait_for_seal`] has returned for that id.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Check access node connectivity
    async fn health_check(&self) -> Result<(), AppError>;

    /// Whether the account holds an FNS collection
    async fn check_is_initialized(&self, addr: &Address) -> Result<bool, AppError>;

    /// Fetch a domain owned by `addr` by its name hash
    async fn get_domain_info_by_name_hash(
        &self,
        addr: &Address,
        name_hash: &str,
    ) -> Result<DomainInfo, AppError>;

    /// Rent cost in FLOW for `name` (without `.fns`) over `duration_secs`
    async fn get_rent_cost(&self, name: &str, duration_secs: u64) -> Result<f64, AppError>;

    /// Renew `name` (without `.fns`) for `duration_secs`
    async fn renew_domain(&self, name: &str, duration_secs: u64) -> Result<String, AppError>;

    async fn update_address_for_domain(
        &self,
        name_hash: &str,
        addr: &Address,
    ) -> Result<String, AppError>;

    async fn update_bio_for_domain(&self, name_hash: &str, bio: &str) -> Result<String, AppError>;

    /// Resolve once the transaction is sealed; fail if it errors or expires
    async fn wait_for_seal(&self, tx_id: &str) -> Result<(), AppError> {
        let _ = tx_id;
        Err(AppError::NotSupported(
            "wait_for_seal not implemented".to_string(),
        ))
    }
}

/// Wallet connector: owns the user session and signs transactions.
#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Receiver of the current session and every later change
    fn subscribe(&self) -> watch::Receiver<Session>;

    /// Ask the wallet to authenticate. The outcome arrives through
    /// [`WalletConnector::subscribe`].
    async fn authenticate(&self) -> Result<(), AppError>;

    /// Ask the wallet to forget the current user
    async fn unauthenticate(&self) -> Result<(), AppError>;

    /// Authorize, sign and send a transaction, returning its id
    async fn authorize_and_send(&self, tx: &TransactionRequest) -> Result<String, AppError> {
        let _ = tx;
        Err(AppError::NotSupported(
            "authorize_and_send not implemented".to_string(),
        ))
    }
}
