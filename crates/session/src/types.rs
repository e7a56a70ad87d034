//! Token store types and expiry predicates.
//!
//! A session holds one access/refresh credential pair per downstream
//! resource server. Credentials expire independently; the predicates here
//! treat the store as one logical session, triggered by the
//! soonest-expiring entry.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Seconds of remaining lifetime below which a credential is considered
/// due for proactive refresh (5 minutes).
pub const REFRESH_BUFFER_SECONDS: i64 = 300;

/// Lifetime of every session cookie entry (7 days).
pub const TOKEN_COOKIE_MAX_AGE: i64 = 7 * 24 * 60 * 60;

/// One access/refresh credential pair scoped to a single resource server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenData {
    /// Opaque bearer credential for the resource server.
    pub access_token: String,

    /// Refresh token, if the provider issued one for this credential.
    pub refresh_token: Option<String>,

    /// Absolute expiry timestamp (Unix seconds), fixed at issuance.
    /// Never recomputed relative to "now" after storage.
    pub expires_at_seconds: i64,

    /// Identity of the downstream service this credential authorizes.
    pub resource_server: String,

    /// Token type, `Bearer` for every provider in use.
    pub token_type: String,

    /// Granted scopes (space-separated).
    pub scope: String,
}

impl TokenData {
    /// Seconds of lifetime remaining at `now`.
    #[must_use]
    pub fn remaining_at(&self, now: i64) -> i64 {
        self.expires_at_seconds - now
    }
}

/// Decoded identity claims from the provider's id token.
///
/// Display-only: the token is decoded without signature verification, and
/// no authorization decision may read these fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

/// User profile derived from [`IdTokenClaims`], shaped for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

impl From<&IdTokenClaims> for UserInfo {
    fn from(claims: &IdTokenClaims) -> Self {
        Self {
            id: claims.sub.clone(),
            name: claims.name.clone(),
            email: claims.email.clone(),
            username: claims.preferred_username.clone(),
            organization: claims.organization.clone(),
        }
    }
}

/// Structured view of one session's credentials.
///
/// Created once per successful code or refresh exchange and never mutated
/// in place: a refresh produces a brand-new store that wholesale-replaces
/// the old one in both runtimes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStore {
    /// Credentials keyed by resource-server identity.
    pub by_resource_server: BTreeMap<String, TokenData>,

    /// Compact 3-part signed identity token, if issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Decoded (unverified) claims from `id_token`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token_claims: Option<IdTokenClaims>,
}

impl TokenStore {
    /// True iff every credential's expiry is at or before `now`.
    ///
    /// A fully expired session can no longer authorize any request; a
    /// session with at least one live entry is still authenticated.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.by_resource_server.values().all(|token| token.expires_at_seconds <= now)
    }

    /// True iff *any* credential's remaining lifetime is within
    /// [`REFRESH_BUFFER_SECONDS`].
    ///
    /// Proactive: the soonest-expiring credential triggers a refresh even
    /// while others remain valid, because one refresh exchange renews the
    /// whole store.
    #[must_use]
    pub fn needs_refresh_at(&self, now: i64) -> bool {
        self.by_resource_server
            .values()
            .any(|token| token.remaining_at(now) <= REFRESH_BUFFER_SECONDS)
    }

    /// [`Self::is_expired_at`] evaluated at the current time.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    /// [`Self::needs_refresh_at`] evaluated at the current time.
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh_at(Utc::now().timestamp())
    }

    /// First refresh token found across entries.
    ///
    /// The session holds at most one authoritative refresh token; entries
    /// are scanned in resource-server order so the result is deterministic.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.by_resource_server
            .values()
            .find_map(|token| token.refresh_token.as_deref())
    }

    /// User profile derived from the identity claims.
    ///
    /// Absent if no id token was issued; credentials remain usable either
    /// way.
    #[must_use]
    pub fn user_info(&self) -> Option<UserInfo> {
        self.id_token_claims.as_ref().map(UserInfo::from)
    }

    /// Credential for the given resource server, if present.
    #[must_use]
    pub fn credential(&self, resource_server: &str) -> Option<&TokenData> {
        self.by_resource_server.get(resource_server)
    }
}

/// Auxiliary credential in the provider's `other_tokens` list.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuxiliaryToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub resource_server: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Raw token-endpoint response (code or refresh exchange).
///
/// The primary credential arrives in the top-level fields; additional
/// resource-server credentials arrive in `other_tokens`. This shape is
/// normalized into a [`TokenStore`] once, at the boundary, and never
/// trusted downstream.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub resource_server: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub other_tokens: Vec<AuxiliaryToken>,
}
