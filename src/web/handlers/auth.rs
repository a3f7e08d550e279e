// Auth handlers: /login and /logout.
//
// Login: only POST is accepted. The body may be a URL-encoded form or JSON;
// either way a missing or unparseable password counts as "". On a match the
// session cookie is set and the browser is sent back to /; otherwise it goes
// to /?error=invalid so the home page can show the notice.
//
// Logout: clears the session cookie and redirects to /. Any method.

use axum::extract::{FromRequest, Request, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::Deserialize;
use tracing::{info, warn};

use crate::web::auth::{
    attempt_login, clear_cookie_header, set_cookie_header, LoginOutcome,
};
use crate::web::AppState;

/// Where the browser lands after login, logout, or a rejected password.
pub const HOME_PATH: &str = "/";
pub const INVALID_PASSWORD_PATH: &str = "/?error=invalid";

#[derive(Deserialize, Default)]
pub struct LoginRequest {
    #[serde(default)]
    password: String,
}

/// /login: authenticate with HOMEPAGE_PASSWORD.
///
/// On success: 302 to `/` with a signed session cookie.
/// On failure: 302 to `/?error=invalid`.
/// Non-POST: 405. Internal failure: 500 with a generic body.
pub async fn login(State(state): State<AppState>, request: Request) -> Response {
    if request.method() != Method::POST {
        return (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed").into_response();
    }

    let body = read_login_body(request, &state).await;

    match attempt_login(&state, &body.password) {
        Ok(LoginOutcome::Authenticated { token }) => {
            info!("Login succeeded");
            let cookie = set_cookie_header(&token, state.config.production);
            (
                StatusCode::FOUND,
                [
                    (header::LOCATION, HOME_PATH),
                    (header::SET_COOKIE, cookie.as_str()),
                ],
            )
                .into_response()
        }
        Ok(LoginOutcome::InvalidPassword) => {
            warn!("Login rejected: invalid password");
            redirect(INVALID_PASSWORD_PATH)
        }
        Err(e) => e.into_response(),
    }
}

/// /logout: clear the session cookie.
pub async fn logout() -> Response {
    info!("Logged out");
    let cookie = clear_cookie_header();
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, HOME_PATH),
            (header::SET_COOKIE, cookie.as_str()),
        ],
    )
        .into_response()
}

/// Parse the login body as JSON or a form, falling back to an empty password.
async fn read_login_body(request: Request, state: &AppState) -> LoginRequest {
    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    let parsed = if is_json {
        Json::<LoginRequest>::from_request(request, state)
            .await
            .map(|Json(body)| body)
            .ok()
    } else {
        Form::<LoginRequest>::from_request(request, state)
            .await
            .map(|Form(body)| body)
            .ok()
    };

    parsed.unwrap_or_default()
}

fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}
