//! Flow access node client.
//!
//! Scripts run through the REST API (`POST /v1/scripts`), transaction results
//! are polled from `GET /v1/transaction_results/{id}`, and writes are handed
//! to the wallet for signing and submission.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::cadence::{
    self, CadenceValue, address_arg, domain_info_from_cadence, string_arg, ufix64_seconds_arg,
};
use super::config::FlowNetworkConfig;
use super::scripts;
use crate::domain::{
    Address, AppError, ChainError, ChainGateway, DomainInfo, TransactionRequest,
    TransactionStatus, WalletConnector, bare_name,
};

/// Gas limit attached to every FNS transaction
pub const DEFAULT_GAS_LIMIT: u64 = 1000;

/// Configuration for the access client
#[derive(Debug, Clone)]
pub struct AccessClientConfig {
    pub timeout: Duration,
    /// Retries for script calls that failed on transport
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Interval between transaction result polls
    pub poll_interval: Duration,
    pub seal_timeout: Duration,
}

impl Default for AccessClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
            poll_interval: Duration::from_secs(1),
            seal_timeout: Duration::from_secs(120),
        }
    }
}

/// Transaction result as returned by the access node
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionResult {
    pub status: String,
    #[serde(default)]
    pub status_code: u32,
    #[serde(default)]
    pub error_message: String,
}

impl TransactionResult {
    #[must_use]
    pub fn status(&self) -> TransactionStatus {
        self.status.parse().unwrap_or_default()
    }
}

/// Transport to the access node REST API, abstracted for testing
#[async_trait]
pub trait AccessApiProvider: Send + Sync {
    /// Run a script; returns the base64 JSON-Cadence result
    async fn execute_script(&self, script: String, arguments: Vec<String>)
    -> Result<String, AppError>;

    async fn get_transaction_result(&self, tx_id: &str) -> Result<TransactionResult, AppError>;

    /// Cheap reachability probe
    async fn ping(&self) -> Result<(), AppError>;
}

#[derive(Debug, Serialize)]
struct ScriptRequest {
    script: String,
    arguments: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AccessApiError {
    #[serde(default)]
    message: String,
}

/// reqwest-backed access node transport
pub struct HttpAccessApiProvider {
    http_client: Client,
    base_url: String,
}

impl HttpAccessApiProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Chain(ChainError::Connection(e.to_string())))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

fn map_transport_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Chain(ChainError::Timeout(e.to_string()))
    } else {
        AppError::Chain(ChainError::Connection(e.to_string()))
    }
}

async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<AccessApiError>(&body) {
        Ok(err) if !err.message.is_empty() => format!("{}: {}", status.as_u16(), err.message),
        _ => format!("{}: {}", status.as_u16(), body),
    }
}

#[async_trait]
impl AccessApiProvider for HttpAccessApiProvider {
    async fn execute_script(
        &self,
        script: String,
        arguments: Vec<String>,
    ) -> Result<String, AppError> {
        let response = self
            .http_client
            .post(format!("{}/v1/scripts", self.base_url))
            .query(&[("block_height", "sealed")])
            .json(&ScriptRequest { script, arguments })
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status.is_server_error() {
            return Err(AppError::Chain(ChainError::Connection(
                error_message(response).await,
            )));
        }
        if !status.is_success() {
            return Err(AppError::Chain(ChainError::ScriptFailed(
                error_message(response).await,
            )));
        }

        response
            .json::<String>()
            .await
            .map_err(|e| AppError::Chain(ChainError::Decode(e.to_string())))
    }

    async fn get_transaction_result(&self, tx_id: &str) -> Result<TransactionResult, AppError> {
        let response = self
            .http_client
            .get(format!("{}/v1/transaction_results/{}", self.base_url, tx_id))
            .send()
            .await
            .map_err(map_transport_error)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(TransactionResult {
                status: TransactionStatus::Unknown.to_string(),
                status_code: 0,
                error_message: String::new(),
            }),
            status if status.is_success() => response
                .json::<TransactionResult>()
                .await
                .map_err(|e| AppError::Chain(ChainError::Decode(e.to_string()))),
            _ => Err(AppError::Chain(ChainError::Connection(
                error_message(response).await,
            ))),
        }
    }

    async fn ping(&self) -> Result<(), AppError> {
        let response = self
            .http_client
            .get(format!("{}/v1/blocks", self.base_url))
            .query(&[("height", "sealed")])
            .send()
            .await
            .map_err(map_transport_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AppError::Chain(ChainError::Connection(
                error_message(response).await,
            )))
        }
    }
}

/// Chain gateway backed by a Flow access node and a wallet
pub struct FlowAccessClient {
    provider: Box<dyn AccessApiProvider>,
    wallet: Arc<dyn WalletConnector>,
    network: FlowNetworkConfig,
    config: AccessClientConfig,
}

impl FlowAccessClient {
    pub fn new(
        network: FlowNetworkConfig,
        wallet: Arc<dyn WalletConnector>,
        config: AccessClientConfig,
    ) -> Result<Self, AppError> {
        let provider = HttpAccessApiProvider::new(&network.access_node_url, config.timeout)?;
        info!(access_node = %network.access_node_url, "Created Flow access client");
        Ok(Self::with_provider(
            Box::new(provider),
            wallet,
            network,
            config,
        ))
    }

    /// Create a client with a specific transport (useful for testing)
    pub fn with_provider(
        provider: Box<dyn AccessApiProvider>,
        wallet: Arc<dyn WalletConnector>,
        network: FlowNetworkConfig,
        config: AccessClientConfig,
    ) -> Self {
        Self {
            provider,
            wallet,
            network,
            config,
        }
    }

    #[must_use]
    pub fn network(&self) -> &FlowNetworkConfig {
        &self.network
    }

    /// Run a script with retries on transport failures
    #[instrument(skip(self, cadence_source, arguments))]
    async fn run_script(
        &self,
        name: &str,
        cadence_source: &str,
        arguments: &[Value],
    ) -> Result<CadenceValue, AppError> {
        let script = cadence::encode_script(&self.network.resolve_imports(cadence_source));
        let arguments: Vec<String> = arguments.iter().map(cadence::encode_base64).collect();

        let mut last_error = None;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(self.config.retry_delay).await;
            }
            match self
                .provider
                .execute_script(script.clone(), arguments.clone())
                .await
            {
                Ok(payload) => {
                    return CadenceValue::from_base64(&payload).map_err(AppError::Chain);
                }
                Err(e @ AppError::Chain(ChainError::Connection(_)))
                | Err(e @ AppError::Chain(ChainError::Timeout(_))) => {
                    warn!(attempt = attempt, error = ?e, script = %name, "Script call failed");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            AppError::Chain(ChainError::Connection("Unknown error".to_string()))
        }))
    }

    fn transaction(&self, cadence_source: &str, arguments: Vec<Value>) -> TransactionRequest {
        TransactionRequest {
            cadence: self.network.resolve_imports(cadence_source),
            arguments,
            gas_limit: DEFAULT_GAS_LIMIT,
        }
    }

    #[instrument(skip(self, tx))]
    async fn send(&self, name: &str, tx: TransactionRequest) -> Result<String, AppError> {
        let tx_id = self.wallet.authorize_and_send(&tx).await?;
        info!(tx_id = %tx_id, transaction = %name, "Transaction submitted");
        Ok(tx_id)
    }
}

#[async_trait]
impl ChainGateway for FlowAccessClient {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        self.provider.ping().await
    }

    #[instrument(skip(self, addr), fields(addr = %addr))]
    async fn check_is_initialized(&self, addr: &Address) -> Result<bool, AppError> {
        let value = self
            .run_script(
                "checkIsInitialized",
                scripts::CHECK_IS_INITIALIZED,
                &[address_arg(addr)],
            )
            .await?;
        value.as_bool().map_err(AppError::Chain)
    }

    #[instrument(skip(self, addr), fields(addr = %addr))]
    async fn get_domain_info_by_name_hash(
        &self,
        addr: &Address,
        name_hash: &str,
    ) -> Result<DomainInfo, AppError> {
        let value = self
            .run_script(
                "getDomainInfoByNameHash",
                scripts::GET_DOMAIN_INFO_BY_NAME_HASH,
                &[address_arg(addr), string_arg(name_hash)],
            )
            .await?;

        let info = value
            .into_inner()
            .ok_or_else(|| AppError::NotFound(format!("domain {}", name_hash)))?;
        let domain = domain_info_from_cadence(&info).map_err(AppError::Chain)?;
        debug!(name = %domain.name, id = domain.id, "Loaded domain info");
        Ok(domain)
    }

    #[instrument(skip(self))]
    async fn get_rent_cost(&self, name: &str, duration_secs: u64) -> Result<f64, AppError> {
        let value = self
            .run_script(
                "getRentCost",
                scripts::GET_RENT_COST,
                &[string_arg(bare_name(name)), ufix64_seconds_arg(duration_secs)],
            )
            .await?;
        value.as_ufix64().map_err(AppError::Chain)
    }

    #[instrument(skip(self))]
    async fn renew_domain(&self, name: &str, duration_secs: u64) -> Result<String, AppError> {
        let tx = self.transaction(
            scripts::RENEW_DOMAIN,
            vec![string_arg(bare_name(name)), ufix64_seconds_arg(duration_secs)],
        );
        self.send("renewDomain", tx).await
    }

    #[instrument(skip(self, addr), fields(addr = %addr))]
    async fn update_address_for_domain(
        &self,
        name_hash: &str,
        addr: &Address,
    ) -> Result<String, AppError> {
        let tx = self.transaction(
            scripts::UPDATE_ADDRESS_FOR_DOMAIN,
            vec![string_arg(name_hash), address_arg(addr)],
        );
        self.send("updateAddressForDomain", tx).await
    }

    #[instrument(skip(self, bio))]
    async fn update_bio_for_domain(&self, name_hash: &str, bio: &str) -> Result<String, AppError> {
        let tx = self.transaction(
            scripts::UPDATE_BIO_FOR_DOMAIN,
            vec![string_arg(name_hash), string_arg(bio)],
        );
        self.send("updateBioForDomain", tx).await
    }

    #[instrument(skip(self))]
    async fn wait_for_seal(&self, tx_id: &str) -> Result<(), AppError> {
        let start = std::time::Instant::now();

        while start.elapsed() < self.config.seal_timeout {
            match self.provider.get_transaction_result(tx_id).await {
                Ok(result) if !result.error_message.is_empty() => {
                    return Err(AppError::Chain(ChainError::TransactionFailed(format!(
                        "{} (status code {})",
                        result.error_message, result.status_code
                    ))));
                }
                Ok(result) => match result.status() {
                    TransactionStatus::Sealed => {
                        info!(tx_id = %tx_id, "Transaction sealed");
                        return Ok(());
                    }
                    TransactionStatus::Expired => {
                        return Err(AppError::Chain(ChainError::TransactionExpired(
                            tx_id.to_string(),
                        )));
                    }
                    status => {
                        debug!(tx_id = %tx_id, status = %status, "Transaction not yet sealed");
                    }
                },
                Err(e) => {
                    warn!(tx_id = %tx_id, error = ?e, "Error checking transaction status");
                }
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }

        Err(AppError::Chain(ChainError::Timeout(format!(
            "Transaction {} not sealed within {}s",
            tx_id,
            self.config.seal_timeout.as_secs()
        ))))
    }
}
