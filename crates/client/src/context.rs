//! Per-app-load session snapshot.

use beamline_session::{decode_store, CookieStore, TokenStore, UserInfo};

/// Snapshot of the session, built once from the cookie store at app load
/// (and rebuilt after a refresh mirrors new tokens into the store).
///
/// Reading the store once keeps every widget's view of the session
/// consistent within a render pass; scattered per-widget cookie reads
/// could straddle a wholesale replace.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    store: Option<TokenStore>,
}

impl SessionContext {
    /// Build the snapshot from the shared cookie store.
    #[must_use]
    pub fn from_cookies<S: CookieStore + ?Sized>(cookies: &S) -> Self {
        Self { store: decode_store(cookies) }
    }

    /// True iff the store held a decodable credential map.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.store.is_some()
    }

    #[must_use]
    pub fn store(&self) -> Option<&TokenStore> {
        self.store.as_ref()
    }

    /// Display profile, if an id token was issued.
    #[must_use]
    pub fn user_info(&self) -> Option<UserInfo> {
        self.store.as_ref().and_then(TokenStore::user_info)
    }

    /// Access token for one resource server, for transport injection.
    #[must_use]
    pub fn access_token_for(&self, resource_server: &str) -> Option<&str> {
        self.store
            .as_ref()
            .and_then(|s| s.credential(resource_server))
            .map(|token| token.access_token.as_str())
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the session snapshot.
    use std::collections::BTreeMap;

    use beamline_session::{persist_session, TokenData, TokenStore};

    use super::*;

    fn store_with_token(resource_server: &str) -> TokenStore {
        let token = TokenData {
            access_token: format!("at-{resource_server}"),
            refresh_token: None,
            expires_at_seconds: 2_000_000_000,
            resource_server: resource_server.to_string(),
            token_type: "Bearer".to_string(),
            scope: String::new(),
        };
        TokenStore {
            by_resource_server: BTreeMap::from([(resource_server.to_string(), token)]),
            id_token: None,
            id_token_claims: None,
        }
    }

    /// Validates snapshot construction from an empty and a populated store.
    ///
    /// Assertions:
    /// - Ensures an empty cookie store snapshots as unauthenticated.
    /// - Confirms a persisted session exposes its access token.
    #[test]
    fn test_snapshot_reflects_cookie_store() {
        let mut cookies: BTreeMap<String, String> = BTreeMap::new();
        assert!(!SessionContext::from_cookies(&cookies).is_authenticated());

        persist_session(&mut cookies, &store_with_token("transfer.api.globus.org"));
        let context = SessionContext::from_cookies(&cookies);
        assert!(context.is_authenticated());
        assert_eq!(
            context.access_token_for("transfer.api.globus.org"),
            Some("at-transfer.api.globus.org")
        );
        assert!(context.access_token_for("auth.globus.org").is_none());
        assert!(context.user_info().is_none());
    }
}
