// GET /api/session: details of the caller's session.
//
// Sits behind require_auth, so reaching the handler already means the gate
// said yes. expires_at is null when auth is disabled.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::DateTime;

use crate::web::auth::{auth_required, session_token};
use crate::web::token::{issued_at, TOKEN_TTL_MS};
use crate::web::{AppState, AuthUser};

pub async fn get_session(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthUser>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let required = auth_required(&state.config);
    let expires_at = if required {
        session_token(&headers)
            .and_then(|token| issued_at(&token))
            .and_then(|ts| ts.checked_add(TOKEN_TTL_MS))
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.to_rfc3339())
    } else {
        None
    };

    Json(serde_json::json!({
        "authenticated": true,
        "auth_required": required,
        "expires_at": expires_at,
    }))
}
