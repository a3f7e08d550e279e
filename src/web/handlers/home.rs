// GET /: the dashboard shell or the login form.
//
// The same path serves both so the login/logout redirects always land
// somewhere meaningful. ?error=invalid adds the rejected-password notice.

use axum::extract::{RawQuery, State};
use axum::http::HeaderMap;
use axum::response::Html;
use percent_encoding::percent_decode_str;

use crate::web::auth::is_authenticated;
use crate::web::AppState;

pub async fn index(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Html<String> {
    if is_authenticated(&state, &headers) {
        Html(dashboard_page(state.config.auth_enabled()))
    } else {
        Html(login_page(has_invalid_error(query.as_deref())))
    }
}

/// Whether the query string carries `error=invalid`. Read leniently so a
/// malformed or repeated parameter still renders the page.
fn has_invalid_error(query: Option<&str>) -> bool {
    query
        .unwrap_or_default()
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .any(|(key, value)| {
            decoded(key).as_deref() == Some("error") && decoded(value).as_deref() == Some("invalid")
        })
}

fn decoded(raw: &str) -> Option<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

fn dashboard_page(show_logout: bool) -> String {
    let logout = if show_logout {
        r#"<form method="post" action="/logout"><button type="submit">Log out</button></form>"#
    } else {
        ""
    };
    page(
        "Homepage",
        &format!(r#"<main id="dashboard"><h1>Homepage</h1>{logout}</main>"#),
    )
}

fn login_page(invalid: bool) -> String {
    let notice = if invalid {
        r#"<p class="error" role="alert">Invalid password</p>"#
    } else {
        ""
    };
    page(
        "Sign in",
        &format!(
            r#"<main id="login"><h1>Sign in</h1>{notice}<form method="post" action="/login"><input type="password" name="password" autofocus required><button type="submit">Sign in</button></form></main>"#
        ),
    )
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{title}</title></head><body>{body}</body></html>"
    )
}
