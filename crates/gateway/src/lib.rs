//! Server runtime of the session subsystem.
//!
//! The gateway fronts the dashboard: it terminates the OAuth flow, keeps
//! the session alive, and gates every page request. Handlers never talk
//! to the provider directly; everything goes through [`provider`], and
//! every session read/write goes through the cookie plumbing in
//! [`http_cookies`].
//!
//! # Module Organization
//!
//! - **[`config`]**: environment-first settings loader
//! - **[`gate`]**: the per-request auth middleware
//! - **[`http_cookies`]**: `Cookie`/`Set-Cookie` translation for the
//!   session entry set
//! - **[`provider`]**: token-endpoint exchanges and response
//!   normalization
//! - **[`routes`]**: router assembly and the auth/health endpoints
//! - **[`logging`]**: tracing setup
//! - **[`state`]**: shared application state

pub mod config;
pub mod gate;
pub mod http_cookies;
pub mod logging;
pub mod provider;
pub mod routes;
pub mod state;

pub use gate::{auth_gate, classify_path, recover_to_sign_in, GateDecision, RouteClass};
pub use provider::{format_token_response, ProviderClient, ProviderError};
pub use routes::router;
pub use state::AppState;
