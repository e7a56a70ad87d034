//! Shared per-process state handed to routes and middleware.

use std::sync::Arc;

use beamline_domain::Settings;

use crate::provider::ProviderClient;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub provider: ProviderClient,
}

impl AppState {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        let provider = ProviderClient::new(settings.oauth.clone(), settings.callback_url());
        Self { settings: Arc::new(settings), provider }
    }

    /// Whether session cookies must carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.settings.environment.secure_cookies()
    }
}
