//! Core session model shared by the browser and server runtimes.
//!
//! The two runtimes share no memory; the only state they both see is the
//! cookie store. This crate defines the structured view of that store and
//! the lossless transform between the two:
//!
//! ```text
//! ┌──────────────┐   encode_store    ┌──────────────────────────┐
//! │  TokenStore  │ ────────────────► │ cookie entries           │
//! │              │                   │ tokens / is_authenticated│
//! │ by_resource_ │ ◄──────────────── │ access_token / ...       │
//! │ server map   │   decode_store    │ (one shared lifecycle)   │
//! └──────────────┘                   └──────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! - **[`types`]**: `TokenData`, `TokenStore`, identity claims, the raw
//!   provider response shape, expiry predicates
//! - **[`claims`]**: best-effort id-token payload decoding
//! - **[`cookies`]**: cookie names, attributes, and the codec
//! - **[`store`]**: the `CookieStore` seam both runtimes implement

pub mod claims;
pub mod cookies;
pub mod store;
pub mod types;

pub use claims::decode_id_token_claims;
pub use cookies::{
    clear_session, decode_store, encode_store, persist_session, CookieAttributes, SessionCookie,
    COOKIE_TOKENS, SESSION_COOKIE_NAMES,
};
pub use store::CookieStore;
pub use types::{
    AuxiliaryToken, IdTokenClaims, ProviderTokenResponse, TokenData, TokenStore, UserInfo,
    REFRESH_BUFFER_SECONDS, TOKEN_COOKIE_MAX_AGE,
};
