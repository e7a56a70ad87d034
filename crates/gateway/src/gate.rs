//! Request-time session enforcement.
//!
//! Every request passes through the gate before its handler. Public and
//! API-internal paths flow straight through; everything else requires a
//! live session. An expired session with a refresh token is refreshed
//! inline, and the handler runs against the refreshed cookies so it never
//! observes the stale ones.

use std::panic::AssertUnwindSafe;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use beamline_domain::constants::{CALLBACK_PATH, SIGN_IN_PATH};
use beamline_session::{decode_store, persist_session};
use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::http_cookies::{
    cookies_from_headers, replace_request_cookies, write_clearing_cookies, write_session_cookies,
};
use crate::state::AppState;

/// Coarse routing class of a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Starts the provider login flow.
    Login,
    /// Ends the session and returns to sign-in.
    Logout,
    /// Reachable without a session.
    Public,
    /// API endpoints; they authenticate their own requests and must never
    /// receive a browser redirect.
    ApiInternal,
    /// Everything else: requires a live session.
    Protected,
}

/// Outcome of gating one protected request, logged per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Unauthenticated,
    ExpiredRefreshable,
    ExpiredUnrefreshable,
    RefreshFailed,
    Authenticated,
}

/// Classify a request path. The protected class is the catch-all: a path
/// added to the app without touching this table is gated, not exposed.
#[must_use]
pub fn classify_path(path: &str) -> RouteClass {
    match path {
        "/login" => RouteClass::Login,
        "/logout" => RouteClass::Logout,
        p if p == SIGN_IN_PATH || p == CALLBACK_PATH || p == "/favicon.ico" => RouteClass::Public,
        p if p.starts_with("/assets/") => RouteClass::Public,
        p if p.starts_with("/api/") => RouteClass::ApiInternal,
        _ => RouteClass::Protected,
    }
}

/// The gate middleware.
pub async fn auth_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    match classify_path(&path) {
        RouteClass::Login => {
            let authorize = state.provider.authorize_url();
            info!(path, "redirecting to provider authorization");
            Redirect::to(&authorize).into_response()
        }
        RouteClass::Logout => {
            info!(path, "logout; clearing session");
            let mut response = Redirect::to(SIGN_IN_PATH).into_response();
            write_clearing_cookies(response.headers_mut());
            response
        }
        RouteClass::Public | RouteClass::ApiInternal => next.run(request).await,
        RouteClass::Protected => gate_protected(state, path, request, next).await,
    }
}

async fn gate_protected(
    state: AppState,
    path: String,
    mut request: Request,
    next: Next,
) -> Response {
    let cookies = cookies_from_headers(request.headers());
    let Some(store) = decode_store(&cookies) else {
        info!(path, decision = ?GateDecision::Unauthenticated, "no session; redirecting");
        return Redirect::to(SIGN_IN_PATH).into_response();
    };

    if !store.is_expired() {
        debug!(path, decision = ?GateDecision::Authenticated, "session live");
        return next.run(request).await;
    }

    let Some(refresh_token) = store.refresh_token().map(String::from) else {
        info!(path, decision = ?GateDecision::ExpiredUnrefreshable, "expired without refresh token");
        return sign_out_redirect();
    };

    let Some(refreshed) = state.provider.refresh_tokens(&refresh_token).await else {
        warn!(path, decision = ?GateDecision::RefreshFailed, "inline refresh failed");
        return sign_out_redirect();
    };

    // Persist before continuing: the handler must observe the refreshed
    // session, and the browser must receive it even if the handler errors.
    info!(path, decision = ?GateDecision::ExpiredRefreshable, "session refreshed inline");
    let mut updated = cookies;
    persist_session(&mut updated, &refreshed);
    replace_request_cookies(request.headers_mut(), &updated);

    let mut response = next.run(request).await;
    write_session_cookies(response.headers_mut(), &refreshed, state.secure_cookies());
    response
}

/// Outermost recovery layer: a panic anywhere below resolves to the
/// sign-in redirect instead of a bare 500, so a broken request path fails
/// toward sign-in like every other gate outcome.
pub async fn recover_to_sign_in(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(_) => {
            error!(path, "request handling panicked; redirecting to sign-in");
            Redirect::to(SIGN_IN_PATH).into_response()
        }
    }
}

fn sign_out_redirect() -> Response {
    let mut response = Redirect::to(SIGN_IN_PATH).into_response();
    write_clearing_cookies(response.headers_mut());
    response
}
