//! Router assembly and the auth/health endpoints.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use beamline_domain::constants::SIGN_IN_PATH;
use beamline_session::decode_store;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::gate::{auth_gate, recover_to_sign_in};
use crate::http_cookies::{cookies_from_headers, write_session_cookies};
use crate::provider::{format_token_response, ProviderError};
use crate::state::AppState;

/// Build the gateway router. Every route sits behind the auth gate; the
/// fallback serves the app shell so unknown paths are gated, never 404'd
/// to anonymous callers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/refresh", post(refresh_session))
        .route("/api/auth/token", post(exchange_token))
        .route("/api/healthcheck", get(healthcheck))
        .route(SIGN_IN_PATH, get(sign_in))
        .fallback(app_shell)
        .layer(middleware::from_fn_with_state(state.clone(), auth_gate))
        .layer(middleware::from_fn(recover_to_sign_in))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct TokenExchangeRequest {
    #[serde(default)]
    code: Option<String>,
}

/// `POST /api/auth/token` — exchange the callback's authorization code.
///
/// Provider rejections pass through with the provider's own status and
/// body so the callback page can show the real reason.
async fn exchange_token(
    State(state): State<AppState>,
    Json(body): Json<TokenExchangeRequest>,
) -> Response {
    let Some(code) = body.code.filter(|code| !code.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing authorization code" })),
        )
            .into_response();
    };

    if state.settings.oauth.client_id.is_empty() || state.settings.oauth.client_secret.is_none() {
        warn!("token exchange requested without configured client credentials");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "OAuth client credentials are not configured" })),
        )
            .into_response();
    }

    match state.provider.exchange_code(&code).await {
        Ok(raw) => {
            let store = format_token_response(&raw, None);
            info!(resource_servers = store.by_resource_server.len(), "login exchange complete");
            let mut response =
                Json(json!({ "tokens": store, "user_info": store.user_info() })).into_response();
            write_session_cookies(response.headers_mut(), &store, state.secure_cookies());
            response
        }
        Err(ProviderError::Provider { status, body }) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, body).into_response()
        }
        Err(ProviderError::Network(message)) => {
            warn!(error = %message, "token exchange unreachable");
            (StatusCode::BAD_GATEWAY, Json(json!({ "error": message }))).into_response()
        }
    }
}

/// `POST /api/auth/refresh` — exchange the session's refresh token.
///
/// Any missing precondition or failed exchange is a 401: the client
/// treats that status as a terminal sign-out.
async fn refresh_session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let cookies = cookies_from_headers(&headers);
    let Some(store) = decode_store(&cookies) else {
        return unauthorized("No session tokens");
    };
    let Some(refresh_token) = store.refresh_token() else {
        return unauthorized("No refresh token available");
    };

    match state.provider.refresh_tokens(refresh_token).await {
        Some(refreshed) => {
            let mut response =
                Json(json!({ "success": true, "tokens": refreshed })).into_response();
            write_session_cookies(response.headers_mut(), &refreshed, state.secure_cookies());
            response
        }
        None => unauthorized("Token refresh failed"),
    }
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "success": false, "error": message })))
        .into_response()
}

/// `GET /api/healthcheck` — liveness probe.
async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn sign_in() -> Html<&'static str> {
    Html(r#"<!doctype html><title>Beamline</title><a href="/login">Sign in</a>"#)
}

/// Shell served for every gated page path; the dashboard assets take over
/// client-side.
async fn app_shell() -> Html<&'static str> {
    Html(r#"<!doctype html><title>Beamline</title><div id="app"></div>"#)
}
