//! Cookie names, attributes, and the TokenStore codec.
//!
//! The store is decomposed into multiple cookie entries sharing one
//! lifecycle: the primary `tokens` entry carries the serialized
//! per-resource-server map, per-credential entries give cheap individual
//! access, and per-field identity entries back the profile UI. The names
//! are a wire contract with the task backend and must not change.

use beamline_domain::constants::PRIMARY_RESOURCE_SERVER;
use tracing::warn;

use crate::claims::decode_id_token_claims;
use crate::store::CookieStore;
use crate::types::{TokenStore, TOKEN_COOKIE_MAX_AGE};

/// Primary entry: serialized `by_resource_server` map. Its presence alone
/// decides "authenticated"; auxiliary entries are conveniences.
pub const COOKIE_TOKENS: &str = "tokens";
pub const COOKIE_IS_AUTHENTICATED: &str = "is_authenticated";
pub const COOKIE_ACCESS_TOKEN: &str = "access_token";
pub const COOKIE_REFRESH_TOKEN: &str = "refresh_token";
pub const COOKIE_ID_TOKEN: &str = "id_token";
pub const COOKIE_NAME: &str = "name";
pub const COOKIE_EMAIL: &str = "email";
pub const COOKIE_PRIMARY_IDENTITY: &str = "primary_identity";
pub const COOKIE_PRIMARY_USERNAME: &str = "primary_username";
pub const COOKIE_INSTITUTION: &str = "institution";

/// Every session entry, in clear order. Written and cleared as one set.
pub const SESSION_COOKIE_NAMES: [&str; 10] = [
    COOKIE_TOKENS,
    COOKIE_IS_AUTHENTICATED,
    COOKIE_NAME,
    COOKIE_EMAIL,
    COOKIE_PRIMARY_IDENTITY,
    COOKIE_PRIMARY_USERNAME,
    COOKIE_INSTITUTION,
    COOKIE_ACCESS_TOKEN,
    COOKIE_REFRESH_TOKEN,
    COOKIE_ID_TOKEN,
];

/// One named entry produced by the codec. Values are raw; the owning
/// store layer applies its own encoding when writing them out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: &'static str,
    pub value: String,
}

/// Attributes applied to every session entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookieAttributes {
    /// Lifetime in seconds; zero expires the entry immediately.
    pub max_age: i64,
    /// `Secure` is set in production deployments only.
    pub secure: bool,
}

impl CookieAttributes {
    /// Standard session-entry attributes.
    #[must_use]
    pub fn session(secure: bool) -> Self {
        Self { max_age: TOKEN_COOKIE_MAX_AGE, secure }
    }

    /// Attributes that expire an entry.
    #[must_use]
    pub fn expired() -> Self {
        Self { max_age: 0, secure: false }
    }

    /// Render the `Set-Cookie` attribute suffix. Path and SameSite are
    /// fixed for every session entry.
    #[must_use]
    pub fn header_suffix(&self) -> String {
        let mut suffix = format!("; Path=/; Max-Age={}; SameSite=Lax", self.max_age);
        if self.secure {
            suffix.push_str("; Secure");
        }
        suffix
    }
}

/// Decompose a [`TokenStore`] into its cookie entries.
///
/// If the primary map fails to serialize, both `tokens` and
/// `is_authenticated` are withheld so the authenticated marker stays
/// consistent with the credentials actually retained; per-credential and
/// identity entries are still emitted.
#[must_use]
pub fn encode_store(store: &TokenStore) -> Vec<SessionCookie> {
    let mut entries = Vec::with_capacity(SESSION_COOKIE_NAMES.len());

    match serde_json::to_string(&store.by_resource_server) {
        Ok(serialized) => {
            entries.push(SessionCookie { name: COOKIE_TOKENS, value: serialized });
            entries.push(SessionCookie {
                name: COOKIE_IS_AUTHENTICATED,
                value: "true".to_string(),
            });
        }
        Err(err) => {
            warn!(error = %err, "token map failed to serialize; session marker withheld");
        }
    }

    if let Some(primary) = store.credential(PRIMARY_RESOURCE_SERVER) {
        entries.push(SessionCookie {
            name: COOKIE_ACCESS_TOKEN,
            value: primary.access_token.clone(),
        });
        if let Some(refresh) = &primary.refresh_token {
            entries.push(SessionCookie { name: COOKIE_REFRESH_TOKEN, value: refresh.clone() });
        }
    }

    if let Some(id_token) = &store.id_token {
        entries.push(SessionCookie { name: COOKIE_ID_TOKEN, value: id_token.clone() });
    }

    if let Some(info) = store.user_info() {
        entries.push(SessionCookie { name: COOKIE_PRIMARY_IDENTITY, value: info.id });
        if let Some(name) = info.name {
            entries.push(SessionCookie { name: COOKIE_NAME, value: name });
        }
        if let Some(email) = info.email {
            entries.push(SessionCookie { name: COOKIE_EMAIL, value: email });
        }
        if let Some(username) = info.username {
            entries.push(SessionCookie { name: COOKIE_PRIMARY_USERNAME, value: username });
        }
        if let Some(organization) = info.organization {
            entries.push(SessionCookie { name: COOKIE_INSTITUTION, value: organization });
        }
    }

    entries
}

/// Reassemble a [`TokenStore`] from the cookie store.
///
/// A missing or unparseable primary `tokens` entry means "not
/// authenticated", independent of whatever auxiliary entries survive.
/// A missing or malformed id token downgrades to absent claims without
/// affecting the credentials.
#[must_use]
pub fn decode_store<S: CookieStore + ?Sized>(cookies: &S) -> Option<TokenStore> {
    let serialized = cookies.get(COOKIE_TOKENS)?;
    let by_resource_server = match serde_json::from_str(&serialized) {
        Ok(map) => map,
        Err(err) => {
            warn!(error = %err, "tokens entry is not a valid credential map");
            return None;
        }
    };

    let id_token = cookies.get(COOKIE_ID_TOKEN);
    let id_token_claims = id_token.as_deref().and_then(decode_id_token_claims);

    Some(TokenStore { by_resource_server, id_token, id_token_claims })
}

/// Write a store's full entry set, wholesale-replacing previous values.
pub fn persist_session<S: CookieStore + ?Sized>(cookies: &mut S, store: &TokenStore) {
    for entry in encode_store(store) {
        cookies.set(entry.name, &entry.value);
    }
}

/// Remove every session entry as one atomic set.
pub fn clear_session<S: CookieStore + ?Sized>(cookies: &mut S) {
    for name in SESSION_COOKIE_NAMES {
        cookies.remove(name);
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the cookie codec.
    use std::collections::BTreeMap;

    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    use super::*;
    use crate::types::TokenData;

    fn sample_store(with_id_token: bool) -> TokenStore {
        let mut by_resource_server = BTreeMap::new();
        by_resource_server.insert(
            PRIMARY_RESOURCE_SERVER.to_string(),
            TokenData {
                access_token: "at-auth".to_string(),
                refresh_token: Some("rt-auth".to_string()),
                expires_at_seconds: 2_000_000,
                resource_server: PRIMARY_RESOURCE_SERVER.to_string(),
                token_type: "Bearer".to_string(),
                scope: "openid email profile".to_string(),
            },
        );
        by_resource_server.insert(
            "transfer.api.globus.org".to_string(),
            TokenData {
                access_token: "at-transfer".to_string(),
                refresh_token: None,
                expires_at_seconds: 2_000_500,
                resource_server: "transfer.api.globus.org".to_string(),
                token_type: "Bearer".to_string(),
                scope: "urn:globus:auth:scope:transfer.api.globus.org:all".to_string(),
            },
        );

        let id_token = with_id_token.then(|| {
            let payload = URL_SAFE_NO_PAD
                .encode(r#"{"sub":"ae341a98","name":"Ada Lovelace","organization":"AE Lab"}"#);
            format!("eyJhbGciOiJSUzI1NiJ9.{payload}.c2ln")
        });
        let id_token_claims = id_token.as_deref().and_then(decode_id_token_claims);

        TokenStore { by_resource_server, id_token, id_token_claims }
    }

    fn as_map(entries: Vec<SessionCookie>) -> BTreeMap<String, String> {
        entries.into_iter().map(|e| (e.name.to_string(), e.value)).collect()
    }

    /// Validates the encode/decode round-trip reproduces the credential
    /// map.
    ///
    /// Assertions:
    /// - Confirms keys, access/refresh tokens, and expiries survive.
    /// - Confirms claims are re-derived from the id token entry.
    #[test]
    fn test_round_trip_preserves_credentials() {
        let store = sample_store(true);
        let mut jar = as_map(encode_store(&store));

        let decoded = decode_store(&jar).unwrap();
        assert_eq!(decoded.by_resource_server, store.by_resource_server);
        assert_eq!(decoded.id_token, store.id_token);
        assert_eq!(
            decoded.id_token_claims.as_ref().map(|c| c.sub.as_str()),
            Some("ae341a98")
        );

        // Idempotent: encoding the decoded store yields the same entries.
        let again = as_map(encode_store(&decoded));
        jar.retain(|k, _| again.contains_key(k));
        assert_eq!(jar, again);
    }

    /// Validates the emitted entry set against the wire contract.
    ///
    /// Assertions:
    /// - Ensures primary, marker, per-credential, and identity entries all
    ///   appear under their contract names.
    #[test]
    fn test_entry_names_match_wire_contract() {
        let entries = as_map(encode_store(&sample_store(true)));
        for name in [
            COOKIE_TOKENS,
            COOKIE_IS_AUTHENTICATED,
            COOKIE_ACCESS_TOKEN,
            COOKIE_REFRESH_TOKEN,
            COOKIE_ID_TOKEN,
            COOKIE_NAME,
            COOKIE_PRIMARY_IDENTITY,
            COOKIE_INSTITUTION,
        ] {
            assert!(entries.contains_key(name), "missing entry {name}");
        }
        assert_eq!(entries[COOKIE_IS_AUTHENTICATED], "true");
        assert_eq!(entries[COOKIE_ACCESS_TOKEN], "at-auth");
        assert_eq!(entries[COOKIE_REFRESH_TOKEN], "rt-auth");
    }

    /// Validates a missing id token leaves credentials usable.
    ///
    /// Assertions:
    /// - Ensures no identity entries are emitted.
    /// - Confirms decode yields credentials with absent claims.
    #[test]
    fn test_missing_id_token_keeps_credentials() {
        let store = sample_store(false);
        let jar = as_map(encode_store(&store));
        assert!(!jar.contains_key(COOKIE_ID_TOKEN));
        assert!(!jar.contains_key(COOKIE_PRIMARY_IDENTITY));

        let decoded = decode_store(&jar).unwrap();
        assert!(decoded.id_token_claims.is_none());
        assert_eq!(decoded.by_resource_server.len(), 2);
    }

    /// Validates a missing primary entry decodes as "not authenticated"
    /// regardless of auxiliary entries.
    ///
    /// Assertions:
    /// - Ensures `decode_store` yields `None` without the `tokens` entry.
    /// - Ensures a corrupt `tokens` entry also yields `None`.
    #[test]
    fn test_missing_or_corrupt_primary_entry() {
        let mut jar = as_map(encode_store(&sample_store(true)));
        jar.remove(COOKIE_TOKENS);
        assert!(decode_store(&jar).is_none());

        let mut corrupt = as_map(encode_store(&sample_store(true)));
        corrupt.insert(COOKIE_TOKENS.to_string(), "{not json".to_string());
        assert!(decode_store(&corrupt).is_none());
    }

    /// Validates `clear_session` removes the full entry set.
    ///
    /// Assertions:
    /// - Ensures every contract name is gone after clearing.
    #[test]
    fn test_clear_session_removes_all_entries() {
        let mut jar = as_map(encode_store(&sample_store(true)));
        jar.insert("unrelated".to_string(), "stays".to_string());

        clear_session(&mut jar);

        for name in SESSION_COOKIE_NAMES {
            assert!(!jar.contains_key(name));
        }
        assert!(jar.contains_key("unrelated"));
    }

    /// Validates `CookieAttributes` header rendering.
    ///
    /// Assertions:
    /// - Confirms the session suffix carries path, max-age, and SameSite.
    /// - Ensures `Secure` appears only when requested.
    #[test]
    fn test_attribute_rendering() {
        let dev = CookieAttributes::session(false).header_suffix();
        assert_eq!(dev, "; Path=/; Max-Age=604800; SameSite=Lax");

        let prod = CookieAttributes::session(true).header_suffix();
        assert!(prod.ends_with("; Secure"));

        let gone = CookieAttributes::expired().header_suffix();
        assert!(gone.contains("Max-Age=0"));
    }
}
