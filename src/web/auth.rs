// Auth gate: password check, session cookies, and request authentication.
//
// Login flow:
//   POST /login { password } → compare with HOMEPAGE_PASSWORD
//     success: mint token, set homepage_auth cookie, 302 → /
//     failure: 302 → /?error=invalid
//
// Auth check (is_authenticated / require_auth):
//   no password configured → allow
//   extract homepage_auth cookie → token::verify → allow or deny
//
// When HOMEPAGE_PASSWORD is empty the whole gate is open.

use std::borrow::Cow;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;
use subtle::ConstantTimeEq;

use super::token::{self, TOKEN_TTL_MS};
use super::{AppState, AuthUser};
use crate::config::Config;

/// Session cookie name.
pub const COOKIE_NAME: &str = "homepage_auth";

/// Cookie Max-Age, matching the token lifetime: 604800 seconds.
pub const SESSION_MAX_AGE_SECS: i64 = TOKEN_TTL_MS / 1000;

/// Failures that can interrupt a login. Surfaced to clients only as a
/// generic 500.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("entropy source failed: {0}")]
    Entropy(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Login failed with internal error");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

/// Result of a login attempt that didn't hit an internal error.
#[derive(Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Password matched; carries the freshly minted session token.
    Authenticated { token: String },
    InvalidPassword,
}

/// Check the submitted password and mint a session token when it matches.
pub fn attempt_login(state: &AppState, password: &str) -> Result<LoginOutcome, AuthError> {
    if !check_password(&state.config, password) {
        return Ok(LoginOutcome::InvalidPassword);
    }
    let token = token::mint(&state.secret)?;
    Ok(LoginOutcome::Authenticated { token })
}

/// Compare a candidate against the configured password in constant time.
///
/// With no password configured only the empty string matches.
pub fn check_password(config: &Config, candidate: &str) -> bool {
    candidate
        .as_bytes()
        .ct_eq(config.password.as_bytes())
        .into()
}

/// Whether the dashboard is password-protected at all.
pub fn auth_required(config: &Config) -> bool {
    config.auth_enabled()
}

/// Decide whether a request carrying `headers` is authenticated.
pub fn is_authenticated(state: &AppState, headers: &HeaderMap) -> bool {
    if !auth_required(&state.config) {
        return true;
    }
    match session_token(headers) {
        Some(token) => token::verify(&state.secret, &token),
        None => false,
    }
}

/// Extract the session token from the request's Cookie header(s).
///
/// The value is percent-decoded: older deployments wrote the token with
/// its colons encoded as `%3A`.
pub fn session_token(headers: &HeaderMap) -> Option<Cow<'_, str>> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| name.trim() == COOKIE_NAME)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .and_then(|value| percent_decode_str(value).decode_utf8().ok())
}

/// Axum middleware: reject requests without a valid session cookie with 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if !is_authenticated(&state, request.headers()) {
        return super::api_error(StatusCode::UNAUTHORIZED, "Authentication required");
    }

    request.extensions_mut().insert(AuthUser);
    next.run(request).await
}

/// Build the `Set-Cookie` header value for a new session.
pub fn set_cookie_header(token: &str, secure: bool) -> String {
    let secure_flag = if secure { "; Secure" } else { "" };
    format!(
        "{COOKIE_NAME}={token}; HttpOnly{secure_flag}; SameSite=Lax; Path=/; Max-Age={SESSION_MAX_AGE_SECS}"
    )
}

/// Build the `Set-Cookie` header value that deletes the session cookie.
pub fn clear_cookie_header() -> String {
    format!("{COOKIE_NAME}=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn cookie_headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_check_password() {
        let config = Config::new("correct", false);
        assert!(check_password(&config, "correct"));
        assert!(!check_password(&config, "wrong"));
        assert!(!check_password(&config, "correct "));
        assert!(!check_password(&config, ""));
    }

    #[test]
    fn test_check_password_unconfigured_matches_only_empty() {
        let config = Config::new("", false);
        assert!(check_password(&config, ""));
        assert!(!check_password(&config, "anything"));
    }

    #[test]
    fn test_auth_required() {
        assert!(auth_required(&Config::new("correct", false)));
        assert!(!auth_required(&Config::new("", false)));
    }

    #[test]
    fn test_open_gate_without_password() {
        let state = AppState::new(Config::new("", false));
        assert!(is_authenticated(&state, &HeaderMap::new()));
        assert!(is_authenticated(&state, &cookie_headers("homepage_auth=garbage")));
    }

    #[test]
    fn test_gate_requires_cookie() {
        let state = AppState::new(Config::new("correct", false));
        assert!(!is_authenticated(&state, &HeaderMap::new()));
        assert!(!is_authenticated(&state, &cookie_headers("other=1")));
        assert!(!is_authenticated(&state, &cookie_headers("homepage_auth=")));
    }

    #[test]
    fn test_gate_accepts_minted_token() {
        let state = AppState::new(Config::new("correct", false));
        let token = token::mint(&state.secret).unwrap();
        let headers = cookie_headers(&format!("theme=dark; homepage_auth={token}; lang=en"));
        assert!(is_authenticated(&state, &headers));
    }

    #[test]
    fn test_gate_rejects_token_from_other_password() {
        let old = AppState::new(Config::new("password-a", false));
        let token = token::mint(&old.secret).unwrap();
        let new = AppState::new(Config::new("password-b", false));
        let headers = cookie_headers(&format!("homepage_auth={token}"));
        assert!(!is_authenticated(&new, &headers));
    }

    #[test]
    fn test_session_token_across_multiple_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("homepage_auth=1:2:3"));
        assert_eq!(session_token(&headers).as_deref(), Some("1:2:3"));
    }

    #[test]
    fn test_session_token_is_percent_decoded() {
        let headers = cookie_headers("homepage_auth=1%3A2%3A3");
        assert_eq!(session_token(&headers).as_deref(), Some("1:2:3"));
    }

    #[test]
    fn test_gate_accepts_percent_encoded_token() {
        let state = AppState::new(Config::new("correct", false));
        let token = token::mint(&state.secret).unwrap();
        let encoded = token.replace(':', "%3A");
        let headers = cookie_headers(&format!("homepage_auth={encoded}"));
        assert!(is_authenticated(&state, &headers));
    }

    #[tokio::test]
    async fn test_internal_error_response_is_generic() {
        let response = AuthError::Entropy("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(body, "Internal Server Error");
        assert!(!body.contains("boom"));
    }

    #[test]
    fn test_attempt_login() {
        let state = AppState::new(Config::new("correct", false));
        assert_eq!(
            attempt_login(&state, "wrong").unwrap(),
            LoginOutcome::InvalidPassword
        );
        match attempt_login(&state, "correct").unwrap() {
            LoginOutcome::Authenticated { token } => assert!(token::verify(&state.secret, &token)),
            LoginOutcome::InvalidPassword => panic!("correct password was rejected"),
        }
    }

    #[test]
    fn test_set_cookie_header() {
        assert_eq!(
            set_cookie_header("1:2:3", false),
            "homepage_auth=1:2:3; HttpOnly; SameSite=Lax; Path=/; Max-Age=604800"
        );
        assert_eq!(
            set_cookie_header("1:2:3", true),
            "homepage_auth=1:2:3; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=604800"
        );
    }

    #[test]
    fn test_clear_cookie_header() {
        let header = clear_cookie_header();
        assert!(header.starts_with("homepage_auth=;"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Max-Age=0"));
    }
}
