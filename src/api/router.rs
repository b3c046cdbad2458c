//! Router construction.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{Method, StatusCode, header},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::app::AppState;

use super::handlers::{
    ApiDoc, config_handler, get_manage_handler, get_session_handler, health_check_handler,
    login_handler, logout_handler, nav_handler, quote_handler, renew_handler,
    update_address_handler, update_bio_handler,
};

/// Default upper bound on a request, including seal waits
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Create the application router with the default request timeout
pub fn create_router(app_state: Arc<AppState>) -> Router {
    create_router_with_timeout(app_state, DEFAULT_REQUEST_TIMEOUT)
}

/// Create the application router
pub fn create_router_with_timeout(app_state: Arc<AppState>, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let api = Router::new()
        .route("/health", get(health_check_handler))
        .route("/config", get(config_handler))
        .route("/session", get(get_session_handler))
        .route("/session/login", post(login_handler))
        .route("/session/logout", post(logout_handler))
        .route("/nav", get(nav_handler))
        .route("/manage/{name_hash}", get(get_manage_handler))
        .route("/manage/{name_hash}/bio", post(update_bio_handler))
        .route("/manage/{name_hash}/address", post(update_address_handler))
        .route("/manage/{name_hash}/renew", post(renew_handler))
        .route("/manage/{name_hash}/quote", get(quote_handler))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    request_timeout,
                ))
                .layer(cors),
        )
}
