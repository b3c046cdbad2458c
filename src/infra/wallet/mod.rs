//! Development wallet connector.
//!
//! Bound to a single configured account. Logging in publishes that account
//! as the current session. Transactions are forwarded to the wallet
//! service's authorization endpoint, which signs and submits them and answers
//! with the transaction id.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::domain::{
    Address, AppError, Session, TransactionRequest, WalletConnector, WalletError,
};

/// Configuration for the development wallet
#[derive(Debug, Clone)]
pub struct DevWalletConfig {
    /// Account the wallet logs in as
    pub account: Option<Address>,
    /// Wallet service endpoint that signs and sends transactions
    pub authz_url: Option<String>,
    /// Bearer token for the authorization endpoint
    pub authz_token: Option<SecretString>,
    pub timeout: Duration,
}

impl Default for DevWalletConfig {
    fn default() -> Self {
        Self {
            account: None,
            authz_url: None,
            authz_token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthzRequest<'a> {
    cadence: &'a str,
    arguments: &'a [serde_json::Value],
    limit: u64,
    proposer: &'a str,
    payer: &'a str,
    authorizations: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthzResponse {
    transaction_id: String,
}

/// Wallet connector for local development and single-account deployments
pub struct DevWallet {
    session: watch::Sender<Session>,
    http_client: Client,
    config: DevWalletConfig,
}

impl DevWallet {
    pub fn new(config: DevWalletConfig) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Wallet(WalletError::Unavailable(e.to_string())))?;

        let (session, _) = watch::channel(Session::logged_out());
        Ok(Self {
            session,
            http_client,
            config,
        })
    }

    /// Publish a session, skipping the notification when nothing changed
    fn publish(&self, next: Session) {
        self.session.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

#[async_trait]
impl WalletConnector for DevWallet {
    fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    #[instrument(skip(self))]
    async fn authenticate(&self) -> Result<(), AppError> {
        let account = self.config.account.clone().ok_or_else(|| {
            AppError::Wallet(WalletError::Unavailable(
                "no wallet account configured".to_string(),
            ))
        })?;
        info!(addr = %account, "Wallet authenticated");
        self.publish(Session::logged_in(account));
        Ok(())
    }

    #[instrument(skip(self))]
    async fn unauthenticate(&self) -> Result<(), AppError> {
        info!("Wallet unauthenticated");
        self.publish(Session::logged_out());
        Ok(())
    }

    #[instrument(skip(self, tx), fields(gas_limit = tx.gas_limit))]
    async fn authorize_and_send(&self, tx: &TransactionRequest) -> Result<String, AppError> {
        let addr = self
            .session
            .borrow()
            .addr
            .clone()
            .ok_or_else(|| AppError::Authentication("wallet is not logged in".to_string()))?;

        let authz_url = self.config.authz_url.as_deref().ok_or_else(|| {
            AppError::Wallet(WalletError::Unavailable(
                "no authorization endpoint configured".to_string(),
            ))
        })?;

        let body = AuthzRequest {
            cadence: &tx.cadence,
            arguments: &tx.arguments,
            limit: tx.gas_limit,
            proposer: addr.as_str(),
            payer: addr.as_str(),
            authorizations: vec![addr.as_str()],
        };

        let mut request = self.http_client.post(authz_url).json(&body);
        if let Some(token) = &self.config.authz_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            AppError::Wallet(WalletError::Unavailable(e.to_string()))
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = %status, message = %message, "Wallet rejected transaction");
            return Err(AppError::Wallet(WalletError::Rejected(format!(
                "{}: {}",
                status.as_u16(),
                message
            ))));
        }

        let authz: AuthzResponse = response
            .json()
            .await
            .map_err(|e| AppError::Wallet(WalletError::InvalidResponse(e.to_string())))?;

        if authz.transaction_id.is_empty() {
            return Err(AppError::Wallet(WalletError::InvalidResponse(
                "empty transaction id".to_string(),
            )));
        }

        info!(tx_id = %authz.transaction_id, "Wallet sent transaction");
        Ok(authz.transaction_id)
    }
}
