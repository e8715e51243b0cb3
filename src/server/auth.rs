//! Login, logout and the token check guarding `/dashboard`
//!
//! There is no real authentication: logging in with any non-empty username
//! sets a `token` cookie, and the dashboard only checks that the cookie is
//! present.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use tera::Context;

use super::{ServerState, SharedState};
use crate::error::Result;
use crate::templates::SiteData;

/// Name of the session cookie
pub const TOKEN_COOKIE: &str = "token";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct LoginForm {
    username: String,
}

/// Redirect to `/login` unless the request carries a token cookie
pub(super) async fn require_token(headers: HeaderMap, request: Request, next: Next) -> Response {
    if has_token(&headers) {
        return next.run(request).await;
    }
    tracing::debug!("No {} cookie for {}, redirecting", TOKEN_COOKIE, request.uri());
    Redirect::to("/login").into_response()
}

pub(super) async fn login_page(State(state): State<SharedState>) -> Response {
    state.respond(render_login(&state, None))
}

pub(super) async fn login(
    State(state): State<SharedState>,
    Form(form): Form<LoginForm>,
) -> Response {
    let username = form.username.trim();
    if username.is_empty() {
        let result = render_login(&state, Some("Username is required"))
            .map(|page| (StatusCode::BAD_REQUEST, page).into_response());
        return state.respond(result);
    }

    tracing::info!("Dashboard login as {:?}", username);
    let token = utf8_percent_encode(username, NON_ALPHANUMERIC).to_string();
    let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", TOKEN_COOKIE, token);
    with_cookie(Redirect::to("/dashboard"), &cookie)
}

pub(super) async fn logout() -> Response {
    let cookie = format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", TOKEN_COOKIE);
    with_cookie(Redirect::to("/login"), &cookie)
}

fn render_login(state: &ServerState, error: Option<&str>) -> Result<Response> {
    let mut context = Context::new();
    context.insert("site", &SiteData::from_config(&state.blog().config));
    context.insert("error", &error.unwrap_or_default());
    let html = state.renderer().render("login.html", &context)?;
    Ok(Html(html).into_response())
}

fn with_cookie(redirect: Redirect, cookie: &str) -> Response {
    let mut response = redirect.into_response();
    if let Ok(value) = HeaderValue::from_str(cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

pub(super) fn has_token(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .any(|h| extract_cookie_value(h, TOKEN_COOKIE).is_some_and(|v| !v.is_empty()))
}

/// Extract a cookie value from a Cookie header
fn extract_cookie_value(cookie_str: &str, cookie_name: &str) -> Option<String> {
    cookie_str
        .split(';')
        .map(|cookie| cookie.trim())
        .find_map(|cookie| {
            let (name, value) = cookie.split_once('=')?;
            (name == cookie_name).then(|| value.to_string())
        })
}
