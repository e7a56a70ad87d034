//! Token-endpoint exchanges with the identity provider.
//!
//! Both grant types go through here: the authorization-code exchange at
//! login and the refresh exchange afterwards. Responses are normalized
//! into a [`TokenStore`] exactly once, at this boundary.

use std::collections::BTreeMap;

use beamline_domain::config::OAuthSettings;
use beamline_domain::constants::PRIMARY_RESOURCE_SERVER;
use beamline_session::{decode_id_token_claims, ProviderTokenResponse, TokenData, TokenStore};
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Access-token lifetime assumed when the provider omits `expires_in`.
const DEFAULT_EXPIRES_IN: i64 = 3600;

/// Errors from the code exchange. The refresh path never surfaces these;
/// it collapses every failure to "no new tokens".
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Network(String),

    /// Non-success response from the token endpoint; the body is kept
    /// verbatim so routes can pass it through.
    #[error("provider returned status {status}")]
    Provider { status: u16, body: String },
}

/// Client for the provider's token endpoint.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    oauth: OAuthSettings,
    redirect_uri: String,
}

impl ProviderClient {
    #[must_use]
    pub fn new(oauth: OAuthSettings, redirect_uri: String) -> Self {
        Self { http: reqwest::Client::new(), oauth, redirect_uri }
    }

    /// Authorization URL the login path redirects to.
    ///
    /// `access_type=offline` asks the provider for a refresh token.
    #[must_use]
    pub fn authorize_url(&self) -> String {
        let params = [
            ("client_id", self.oauth.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", self.oauth.scopes.as_str()),
            ("access_type", "offline"),
        ];
        let query = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{query}", self.oauth.authorize_url)
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    /// `ProviderError::Provider` carries the provider's own status and
    /// body for pass-through; `ProviderError::Network` covers transport
    /// and decode failures.
    pub async fn exchange_code(&self, code: &str) -> Result<ProviderTokenResponse, ProviderError> {
        let mut form = vec![
            ("grant_type", "authorization_code".to_string()),
            ("code", code.to_string()),
            ("redirect_uri", self.redirect_uri.clone()),
            ("client_id", self.oauth.client_id.clone()),
        ];
        if let Some(secret) = &self.oauth.client_secret {
            form.push(("client_secret", secret.clone()));
        }

        let response = self
            .http
            .post(&self.oauth.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|err| ProviderError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "code exchange rejected by provider");
            return Err(ProviderError::Provider { status: status.as_u16(), body });
        }

        let parsed = response
            .json::<ProviderTokenResponse>()
            .await
            .map_err(|err| ProviderError::Network(err.to_string()))?;
        info!("authorization code exchanged");
        Ok(parsed)
    }

    /// Exchange a refresh token for a new token set.
    ///
    /// Collapses every failure (transport, non-success status, malformed
    /// body) to `None`: callers decide between retry-later and sign-out
    /// from context, not from error detail.
    pub async fn refresh_tokens(&self, refresh_token: &str) -> Option<TokenStore> {
        let mut form = vec![
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", refresh_token.to_string()),
            ("client_id", self.oauth.client_id.clone()),
        ];
        if let Some(secret) = &self.oauth.client_secret {
            form.push(("client_secret", secret.clone()));
        }

        let response = match self.http.post(&self.oauth.token_url).form(&form).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "refresh exchange did not reach the provider");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(status = response.status().as_u16(), "refresh exchange rejected");
            return None;
        }

        match response.json::<ProviderTokenResponse>().await {
            Ok(parsed) => {
                info!("refresh exchange succeeded");
                Some(format_token_response(&parsed, Some(refresh_token)))
            }
            Err(err) => {
                warn!(error = %err, "refresh response body was malformed");
                None
            }
        }
    }
}

/// Normalize a raw token response into a [`TokenStore`].
///
/// The top-level fields become the primary credential; each `other_tokens`
/// entry becomes a credential under its own resource server. A primary
/// entry issued without a refresh token inherits `fallback_refresh` (the
/// token spent on a refresh exchange stays valid and must be retained);
/// auxiliary entries keep exactly what the provider issued.
#[must_use]
pub fn format_token_response(
    response: &ProviderTokenResponse,
    fallback_refresh: Option<&str>,
) -> TokenStore {
    let now = Utc::now().timestamp();
    let mut by_resource_server = BTreeMap::new();

    let primary_server = response
        .resource_server
        .clone()
        .unwrap_or_else(|| PRIMARY_RESOURCE_SERVER.to_string());
    by_resource_server.insert(
        primary_server.clone(),
        TokenData {
            access_token: response.access_token.clone(),
            refresh_token: response
                .refresh_token
                .clone()
                .or_else(|| fallback_refresh.map(String::from)),
            expires_at_seconds: now + response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
            resource_server: primary_server,
            token_type: response.token_type.clone().unwrap_or_else(|| "Bearer".to_string()),
            scope: response.scope.clone().unwrap_or_default(),
        },
    );

    for auxiliary in &response.other_tokens {
        let Some(server) = auxiliary.resource_server.clone() else {
            debug!("auxiliary token without a resource server; dropped");
            continue;
        };
        by_resource_server.insert(
            server.clone(),
            TokenData {
                access_token: auxiliary.access_token.clone(),
                refresh_token: auxiliary.refresh_token.clone(),
                expires_at_seconds: now + auxiliary.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
                resource_server: server,
                token_type: auxiliary.token_type.clone().unwrap_or_else(|| "Bearer".to_string()),
                scope: auxiliary.scope.clone().unwrap_or_default(),
            },
        );
    }

    let id_token_claims = response.id_token.as_deref().and_then(decode_id_token_claims);

    TokenStore { by_resource_server, id_token: response.id_token.clone(), id_token_claims }
}
