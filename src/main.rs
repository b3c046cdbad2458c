//! Application entry point.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use secrecy::SecretString;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use fns_client::api::{DEFAULT_REQUEST_TIMEOUT, create_router_with_timeout};
use fns_client::app::{AppState, SessionProvider};
use fns_client::domain::Address;
use fns_client::infra::{
    AccessClientConfig, DevWallet, DevWalletConfig, FlowAccessClient, FlowNetworkConfig,
};

/// Application configuration
struct Config {
    host: String,
    port: u16,
    request_timeout: Duration,
    network: FlowNetworkConfig,
    wallet: DevWalletConfig,
}

impl Config {
    fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);
        let request_timeout = env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map_or(DEFAULT_REQUEST_TIMEOUT, Duration::from_secs);

        let network = FlowNetworkConfig::from_env().context("Invalid Flow network configuration")?;

        let account = env::var("FNS_WALLET_ADDRESS")
            .ok()
            .filter(|a| !a.is_empty())
            .map(|a| a.parse::<Address>())
            .transpose()
            .context("FNS_WALLET_ADDRESS is not a valid Flow address")?;
        let authz_url = env::var("FNS_WALLET_AUTHZ_URL")
            .ok()
            .filter(|u| !u.is_empty());
        let authz_token = env::var("FNS_WALLET_AUTHZ_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .map(SecretString::from);

        Ok(Self {
            host,
            port,
            request_timeout,
            network,
            wallet: DevWalletConfig {
                account,
                authz_url,
                authz_token,
                ..Default::default()
            },
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    info!("Flow Name Service client v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!(
        access_node = %config.network.access_node_url,
        domains = %config.network.domains_address,
        "Network configured"
    );

    match &config.wallet.account {
        Some(account) => info!(account = %account, "Wallet account configured"),
        None => warn!("FNS_WALLET_ADDRESS not set, login is unavailable"),
    }
    if config.wallet.authz_url.is_none() {
        warn!("FNS_WALLET_AUTHZ_URL not set, domain updates are unavailable");
    }

    let wallet = Arc::new(DevWallet::new(config.wallet).context("Failed to create wallet")?);
    let gateway = Arc::new(
        FlowAccessClient::new(
            config.network.clone(),
            wallet.clone(),
            AccessClientConfig::default(),
        )
        .context("Failed to create Flow access client")?,
    );

    let session = SessionProvider::start(wallet, gateway.clone());
    let app_state = Arc::new(AppState::new(
        Arc::clone(&session),
        gateway,
        config.network,
    ));
    let router = create_router_with_timeout(app_state, config.request_timeout);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server starting on http://{}", addr);
    info!("Swagger UI available at http://{}/swagger-ui", addr);
    info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    session.shutdown();
    info!("Server shutdown complete");
    Ok(())
}
