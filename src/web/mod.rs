// Web server: Axum-based single-tenant dashboard with a password gate.
//
// Public routes: the home page (login form or dashboard shell), /login,
// /logout and /health. Everything under /api/* sits behind require_auth.
//
// Auth: stateless HMAC-SHA256 session cookies. No session table.

use std::sync::Arc;

use anyhow::Result;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;

pub mod auth;
pub mod handlers;
pub mod token;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub secret: Arc<token::SigningSecret>,
}

impl AppState {
    /// Wrap the config and derive the signing secret from its password.
    pub fn new(config: Config) -> Self {
        let secret = token::SigningSecret::derive(&config.password);
        Self {
            config: Arc::new(config),
            secret: Arc::new(secret),
        }
    }
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(config: Config) -> Result<()> {
    let addr = format!("{}:{}", config.bind, config.port);
    if !config.auth_enabled() {
        warn!("HOMEPAGE_PASSWORD is not set; the dashboard is open to everyone");
    }
    if config.auth_enabled() && !config.production {
        info!("Session cookies are not marked Secure (HOMEPAGE_ENV is not production)");
    }

    let app = build_router(AppState::new(config));

    info!("Homepage listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Assemble the full router: public pages, the login/logout endpoints and
/// the authenticated API.
pub fn build_router(state: AppState) -> Router {
    // Authenticated API routes (require valid session cookie)
    let protected_api = Router::new()
        .route("/api/session", get(handlers::session::get_session))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    // Public routes (no auth). /login and /logout accept every method so
    // the login handler can answer non-POST requests itself.
    let public = Router::new()
        .route("/", get(handlers::home::index))
        .route("/health", get(health))
        .route("/login", any(handlers::auth::login))
        .route("/logout", any(handlers::auth::logout));

    Router::new()
        .merge(protected_api)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness check: always returns 200 OK.
async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}

/// Typed JSON error response helper.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}

/// Marker type indicating the request passed session authentication.
/// Inserted into request extensions by `require_auth` middleware.
#[derive(Clone)]
pub struct AuthUser;
