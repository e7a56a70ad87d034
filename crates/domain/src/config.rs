//! Configuration structures consumed by the gateway and client runtimes.
//!
//! Loading lives with the consuming crate (the gateway's `config` module);
//! this module only defines the typed shape.

use serde::{Deserialize, Serialize};

use crate::constants::{AUTHORIZE_URL, DEFAULT_SCOPES, TOKEN_URL};

/// Deployment environment. Controls the `Secure` cookie attribute and the
/// default base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Whether session cookies must carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// OAuth provider settings.
///
/// The client secret is server-only: the client runtime receives a copy of
/// this struct with `client_secret` set to `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthSettings {
    /// OAuth client id registered with the provider.
    pub client_id: String,

    /// OAuth client secret. Required for code and refresh exchanges,
    /// never exposed to the client runtime.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Space-separated scope string requested at login.
    pub scopes: String,

    /// Provider authorization endpoint.
    pub authorize_url: String,

    /// Provider token endpoint.
    pub token_url: String,
}

impl OAuthSettings {
    /// Create settings with provider defaults for endpoints and scopes.
    #[must_use]
    pub fn new(client_id: String, client_secret: Option<String>) -> Self {
        Self {
            client_id,
            client_secret,
            scopes: DEFAULT_SCOPES.to_string(),
            authorize_url: AUTHORIZE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
        }
    }
}

/// Gateway server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address the gateway binds to, e.g. `127.0.0.1:3000`.
    pub bind_addr: String,

    /// Externally visible base URL used to build the OAuth callback
    /// address, e.g. `http://localhost:3000`.
    pub base_url: String,
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub environment: Environment,
    pub oauth: OAuthSettings,
    pub server: ServerSettings,
}

impl Settings {
    /// Full redirect URI presented to the provider.
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!("{}{}", self.server.base_url, crate::constants::CALLBACK_PATH)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for config.
    use super::*;

    fn settings() -> Settings {
        Settings {
            environment: Environment::Development,
            oauth: OAuthSettings::new("client_abc".to_string(), Some("secret".to_string())),
            server: ServerSettings {
                bind_addr: "127.0.0.1:3000".to_string(),
                base_url: "http://localhost:3000".to_string(),
            },
        }
    }

    /// Validates `Settings::callback_url` composition from the base URL.
    ///
    /// Assertions:
    /// - Confirms `settings().callback_url()` equals
    ///   `"http://localhost:3000/auth/callback"`.
    #[test]
    fn test_callback_url() {
        assert_eq!(settings().callback_url(), "http://localhost:3000/auth/callback");
    }

    /// Validates `OAuthSettings::new` provider defaults.
    ///
    /// Assertions:
    /// - Ensures the default scope string names openid.
    /// - Confirms the authorize and token endpoints point at the provider.
    #[test]
    fn test_oauth_defaults() {
        let oauth = OAuthSettings::new("id".to_string(), None);
        assert!(oauth.scopes.contains("openid"));
        assert!(oauth.authorize_url.ends_with("/authorize"));
        assert!(oauth.token_url.ends_with("/token"));
    }

    /// Validates `Environment::secure_cookies` per environment.
    ///
    /// Assertions:
    /// - Ensures production requires secure cookies and development does not.
    #[test]
    fn test_secure_cookies() {
        assert!(Environment::Production.secure_cookies());
        assert!(!Environment::Development.secure_cookies());
    }
}
