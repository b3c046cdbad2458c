//! HTTP request handlers with OpenAPI documentation.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use utoipa::{OpenApi, ToSchema};
use validator::Validate;

use crate::app::{
    AppState, DomainManager, ManagePage, NavAction, NavBar, NavLink, SessionControl,
};
use crate::domain::{
    AppError, ChainError, ErrorDetail, ErrorResponse, HealthResponse, HealthStatus, QuoteParams,
    QuoteState, RenewRequest, RenewalQuote, Session, SessionSnapshot, UpdateAddressRequest,
    UpdateBioRequest, ValidationError, WalletError,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Flow Name Service Client API",
        version = "0.1.0",
        description = "Session, navigation and domain management for the Flow Name Service",
        license(
            name = "MIT"
        )
    ),
    paths(
        health_check_handler,
        config_handler,
        get_session_handler,
        login_handler,
        logout_handler,
        nav_handler,
        get_manage_handler,
        update_bio_handler,
        update_address_handler,
        renew_handler,
        quote_handler,
    ),
    components(
        schemas(
            HealthResponse,
            HealthStatus,
            NetworkConfigResponse,
            Session,
            SessionSnapshot,
            NavBar,
            NavLink,
            NavAction,
            SessionControl,
            ManagePage,
            QuoteState,
            RenewalQuote,
            UpdateBioRequest,
            UpdateAddressRequest,
            RenewRequest,
            QuoteParams,
            ErrorResponse,
            ErrorDetail,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "session", description = "Wallet session endpoints"),
        (name = "manage", description = "Domain management endpoints")
    )
)]
pub struct ApiDoc;

/// Network configuration entries
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NetworkConfigResponse {
    /// Configuration key to value, e.g. `accessNode.api`
    pub entries: BTreeMap<String, String>,
}

/// Detailed health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health status", body = HealthResponse)
    )
)]
pub async fn health_check_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let chain = match state.gateway.health_check().await {
        Ok(()) => HealthStatus::Healthy,
        Err(e) => {
            error!(error = %e, "Access node health check failed");
            HealthStatus::Unhealthy
        }
    };
    Json(HealthResponse::new(chain))
}

/// Network configuration the client runs against
#[utoipa::path(
    get,
    path = "/config",
    tag = "health",
    responses(
        (status = 200, description = "Configuration entries", body = NetworkConfigResponse)
    )
)]
pub async fn config_handler(State(state): State<Arc<AppState>>) -> Json<NetworkConfigResponse> {
    Json(NetworkConfigResponse {
        entries: state.network.entries(),
    })
}

/// Current session and initialization flag
#[utoipa::path(
    get,
    path = "/session",
    tag = "session",
    responses(
        (status = 200, description = "Current session", body = SessionSnapshot)
    )
)]
pub async fn get_session_handler(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    Json(state.session.snapshot())
}

/// Ask the wallet to log in
///
/// The new session is published asynchronously; poll `GET /session`.
#[utoipa::path(
    post,
    path = "/session/login",
    tag = "session",
    responses(
        (status = 202, description = "Login requested"),
        (status = 503, description = "Wallet unavailable", body = ErrorResponse)
    )
)]
pub async fn login_handler(State(state): State<Arc<AppState>>) -> Result<StatusCode, AppError> {
    state.session.log_in().await?;
    Ok(StatusCode::ACCEPTED)
}

/// Log out
///
/// The returned session is already logged out, even before the wallet confirms.
#[utoipa::path(
    post,
    path = "/session/logout",
    tag = "session",
    responses(
        (status = 200, description = "Session after logout", body = SessionSnapshot),
        (status = 503, description = "Wallet unavailable", body = ErrorResponse)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let result = state.session.log_out().await;
    state.prune_managers();
    result?;
    Ok(Json(state.session.snapshot()))
}

/// Navigation bar for the current session
#[utoipa::path(
    get,
    path = "/nav",
    tag = "session",
    responses(
        (status = 200, description = "Navigation bar", body = NavBar)
    )
)]
pub async fn nav_handler(State(state): State<Arc<AppState>>) -> Json<NavBar> {
    Json(NavBar::for_session(&state.session.current()))
}

/// Open the management view for a domain
///
/// Always reloads the domain. Answers 204 when there is nothing to show,
/// for example while the account is not initialized.
#[utoipa::path(
    get,
    path = "/manage/{name_hash}",
    tag = "manage",
    params(
        ("name_hash" = String, Path, description = "Domain name hash")
    ),
    responses(
        (status = 200, description = "Management page", body = ManagePage),
        (status = 204, description = "Nothing to render"),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 404, description = "Domain not found", body = ErrorResponse),
        (status = 503, description = "Access node unavailable", body = ErrorResponse)
    )
)]
pub async fn get_manage_handler(
    State(state): State<Arc<AppState>>,
    Path(name_hash): Path<String>,
) -> Result<Response, AppError> {
    let manager = state.manager_for(&name_hash)?;
    match manager.load().await {
        Ok(_) => {}
        Err(AppError::Precondition(reason)) => {
            debug!(name_hash = %name_hash, reason = %reason, "Nothing to render");
            state.forget(&manager);
        }
        Err(e @ AppError::NotFound(_)) => {
            state.forget(&manager);
            return Err(e);
        }
        Err(e) => return Err(e),
    }
    Ok(page_response(&manager))
}

/// Update the domain's bio
#[utoipa::path(
    post,
    path = "/manage/{name_hash}/bio",
    tag = "manage",
    params(
        ("name_hash" = String, Path, description = "Domain name hash")
    ),
    request_body = UpdateBioRequest,
    responses(
        (status = 200, description = "Page after the sealed update", body = ManagePage),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Another update is in progress", body = ErrorResponse),
        (status = 502, description = "Transaction failed", body = ErrorResponse)
    )
)]
pub async fn update_bio_handler(
    State(state): State<Arc<AppState>>,
    Path(name_hash): Path<String>,
    Json(payload): Json<UpdateBioRequest>,
) -> Result<Response, AppError> {
    validate(&payload)?;
    let manager = state.manager_for(&name_hash)?;
    manager.update_bio(&payload.bio).await?;
    Ok(page_response(&manager))
}

/// Link an address to the domain
#[utoipa::path(
    post,
    path = "/manage/{name_hash}/address",
    tag = "manage",
    params(
        ("name_hash" = String, Path, description = "Domain name hash")
    ),
    request_body = UpdateAddressRequest,
    responses(
        (status = 200, description = "Page after the sealed update", body = ManagePage),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Another update is in progress", body = ErrorResponse),
        (status = 502, description = "Transaction failed", body = ErrorResponse)
    )
)]
pub async fn update_address_handler(
    State(state): State<Arc<AppState>>,
    Path(name_hash): Path<String>,
    Json(payload): Json<UpdateAddressRequest>,
) -> Result<Response, AppError> {
    validate(&payload)?;
    let manager = state.manager_for(&name_hash)?;
    manager.update_address(&payload.address).await?;
    Ok(page_response(&manager))
}

/// Renew the domain
#[utoipa::path(
    post,
    path = "/manage/{name_hash}/renew",
    tag = "manage",
    params(
        ("name_hash" = String, Path, description = "Domain name hash")
    ),
    request_body = RenewRequest,
    responses(
        (status = 200, description = "Page after the sealed renewal", body = ManagePage),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Another update is in progress", body = ErrorResponse),
        (status = 502, description = "Transaction failed", body = ErrorResponse)
    )
)]
pub async fn renew_handler(
    State(state): State<Arc<AppState>>,
    Path(name_hash): Path<String>,
    Json(payload): Json<RenewRequest>,
) -> Result<Response, AppError> {
    validate(&payload)?;
    let manager = state.manager_for(&name_hash)?;
    manager.renew(payload.years).await?;
    Ok(page_response(&manager))
}

/// Price a renewal
#[utoipa::path(
    get,
    path = "/manage/{name_hash}/quote",
    tag = "manage",
    params(
        ("name_hash" = String, Path, description = "Domain name hash"),
        ("years" = Option<u32>, Query, description = "Years to renew for (default: 1)")
    ),
    responses(
        (status = 200, description = "Renewal quote", body = QuoteState),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    )
)]
pub async fn quote_handler(
    State(state): State<Arc<AppState>>,
    Path(name_hash): Path<String>,
    Query(params): Query<QuoteParams>,
) -> Result<Json<QuoteState>, AppError> {
    let manager = state.manager_for(&name_hash)?;
    Ok(Json(manager.refresh_quote(params.years).await))
}

fn validate<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(ValidationError::Multiple(e.to_string())))
}

fn page_response(manager: &DomainManager) -> Response {
    match manager.render() {
        Some(page) => Json(page).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::Chain(chain_err) => match chain_err {
                ChainError::Connection(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "chain_error",
                    self.to_string(),
                ),
                ChainError::Timeout(_) => {
                    (StatusCode::GATEWAY_TIMEOUT, "timeout", self.to_string())
                }
                ChainError::TransactionFailed(_) | ChainError::TransactionExpired(_) => (
                    StatusCode::BAD_GATEWAY,
                    "transaction_failed",
                    self.to_string(),
                ),
                ChainError::ScriptFailed(_) | ChainError::Decode(_) => {
                    (StatusCode::BAD_GATEWAY, "chain_error", self.to_string())
                }
            },
            AppError::Wallet(wallet_err) => match wallet_err {
                WalletError::Unavailable(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "wallet_unavailable",
                    self.to_string(),
                ),
                WalletError::Rejected(_) => (
                    StatusCode::BAD_GATEWAY,
                    "wallet_rejected",
                    self.to_string(),
                ),
                WalletError::InvalidResponse(_) => {
                    (StatusCode::BAD_GATEWAY, "wallet_error", self.to_string())
                }
            },
            AppError::Validation(ValidationError::RenewalDuration) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                ValidationError::RenewalDuration.to_string(),
            ),
            AppError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                self.to_string(),
            ),
            AppError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "configuration_error",
                self.to_string(),
            ),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            AppError::MutationInProgress(_) => (
                StatusCode::CONFLICT,
                "mutation_in_progress",
                self.to_string(),
            ),
            AppError::Authentication(_) => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                self.to_string(),
            ),
            AppError::Precondition(_) => (
                StatusCode::PRECONDITION_FAILED,
                "precondition_failed",
                self.to_string(),
            ),
            AppError::Serialization(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "serialization_error",
                self.to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                self.to_string(),
            ),
            AppError::NotSupported(_) => (
                StatusCode::NOT_IMPLEMENTED,
                "not_supported",
                self.to_string(),
            ),
        };

        if status.is_server_error() {
            error!(error_type = %error_type, message = %message, "Server error");
        }

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                r#type: error_type.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}
