//! Configuration loading.
//!
//! Environment variables win; a TOML file is the fallback for local
//! development. `.env` files are read via `dotenvy` before either source
//! is consulted.
//!
//! ## Environment variables
//! - `BEAMLINE_ENV`: `development` (default) or `production`
//! - `BEAMLINE_OAUTH_CLIENT_ID`: OAuth client id (required)
//! - `BEAMLINE_OAUTH_CLIENT_SECRET`: OAuth client secret
//! - `BEAMLINE_OAUTH_SCOPES`: scope string (defaults to the provider set)
//! - `BEAMLINE_BASE_URL`: externally visible base URL (required)
//! - `BEAMLINE_BIND_ADDR`: listen address (default `127.0.0.1:3000`)
//!
//! ## File locations
//! `./beamline.toml`, then `./config.toml`, then the same two in the
//! parent directory.

use std::path::PathBuf;

use beamline_domain::config::{Environment, OAuthSettings, ServerSettings, Settings};
use beamline_domain::constants::DEFAULT_SCOPES;
use beamline_domain::{BeamlineError, Result};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Load configuration, environment first, file fallback.
///
/// # Errors
/// Returns `BeamlineError::Config` when neither source yields a complete
/// configuration.
pub fn load() -> Result<Settings> {
    dotenvy::dotenv().ok();

    match load_from_env() {
        Ok(settings) => {
            tracing::info!("configuration loaded from environment");
            Ok(settings)
        }
        Err(env_err) => {
            tracing::debug!(error = %env_err, "environment incomplete; trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from `BEAMLINE_*` environment variables.
///
/// # Errors
/// Returns `BeamlineError::Config` if a required variable is missing or
/// malformed.
pub fn load_from_env() -> Result<Settings> {
    let environment = match std::env::var("BEAMLINE_ENV").ok().as_deref() {
        None | Some("development") => Environment::Development,
        Some("production") => Environment::Production,
        Some(other) => {
            return Err(BeamlineError::Config(format!("Unknown BEAMLINE_ENV value: {other}")))
        }
    };

    let client_id = env_var("BEAMLINE_OAUTH_CLIENT_ID")?;
    let client_secret = std::env::var("BEAMLINE_OAUTH_CLIENT_SECRET").ok();
    let scopes =
        std::env::var("BEAMLINE_OAUTH_SCOPES").unwrap_or_else(|_| DEFAULT_SCOPES.to_string());
    let base_url = env_var("BEAMLINE_BASE_URL")?;
    let bind_addr =
        std::env::var("BEAMLINE_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

    let mut oauth = OAuthSettings::new(client_id, client_secret);
    oauth.scopes = scopes;

    Ok(Settings { environment, oauth, server: ServerSettings { bind_addr, base_url } })
}

/// Load configuration from a TOML file.
///
/// # Errors
/// Returns `BeamlineError::Config` if the file is missing, unreadable, or
/// not valid TOML for [`Settings`].
pub fn load_from_file(path: Option<PathBuf>) -> Result<Settings> {
    let config_path = match path {
        Some(p) if p.exists() => p,
        Some(p) => {
            return Err(BeamlineError::Config(format!("Config file not found: {}", p.display())))
        }
        None => probe_config_paths().ok_or_else(|| {
            BeamlineError::Config("No config file found in the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| BeamlineError::Config(format!("Failed to read config file: {e}")))?;
    toml::from_str(&contents)
        .map_err(|e| BeamlineError::Config(format!("Invalid TOML configuration: {e}")))
}

/// First existing candidate among the standard config locations.
#[must_use]
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend([
            cwd.join("beamline.toml"),
            cwd.join("config.toml"),
            cwd.join("../beamline.toml"),
            cwd.join("../config.toml"),
        ]);
    }
    candidates.into_iter().find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| BeamlineError::Config(format!("Missing required environment variable: {key}")))
}

#[cfg(test)]
mod tests {
    //! Unit tests for configuration loading.
    use std::io::Write;
    use std::sync::Mutex;

    use super::*;

    // Environment variables are process-global; serialize the tests that
    // touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            "BEAMLINE_ENV",
            "BEAMLINE_OAUTH_CLIENT_ID",
            "BEAMLINE_OAUTH_CLIENT_SECRET",
            "BEAMLINE_OAUTH_SCOPES",
            "BEAMLINE_BASE_URL",
            "BEAMLINE_BIND_ADDR",
        ] {
            std::env::remove_var(key);
        }
    }

    /// Validates a full environment-based load.
    ///
    /// Assertions:
    /// - Confirms every field maps from its variable.
    /// - Ensures production mode enables secure cookies.
    #[test]
    fn test_load_from_env_complete() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("BEAMLINE_ENV", "production");
        std::env::set_var("BEAMLINE_OAUTH_CLIENT_ID", "client-1");
        std::env::set_var("BEAMLINE_OAUTH_CLIENT_SECRET", "secret-1");
        std::env::set_var("BEAMLINE_BASE_URL", "https://dash.example.edu");
        std::env::set_var("BEAMLINE_BIND_ADDR", "0.0.0.0:8080");

        let settings = load_from_env().unwrap();
        assert_eq!(settings.environment, Environment::Production);
        assert!(settings.environment.secure_cookies());
        assert_eq!(settings.oauth.client_id, "client-1");
        assert_eq!(settings.oauth.client_secret.as_deref(), Some("secret-1"));
        assert!(settings.oauth.scopes.contains("openid"));
        assert_eq!(settings.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(settings.callback_url(), "https://dash.example.edu/auth/callback");

        clear_env();
    }

    /// Validates missing and malformed environment values.
    ///
    /// Assertions:
    /// - Ensures a missing client id fails with a `Config` error.
    /// - Ensures an unknown environment name is rejected.
    #[test]
    fn test_load_from_env_rejects_bad_values() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, BeamlineError::Config(_)));

        std::env::set_var("BEAMLINE_ENV", "staging");
        std::env::set_var("BEAMLINE_OAUTH_CLIENT_ID", "client-1");
        std::env::set_var("BEAMLINE_BASE_URL", "http://localhost:3000");
        let err = load_from_env().unwrap_err();
        assert!(err.to_string().contains("BEAMLINE_ENV"));

        clear_env();
    }

    /// Validates file-based loading.
    ///
    /// Assertions:
    /// - Confirms a TOML settings file parses into `Settings`.
    /// - Ensures a missing path yields a `Config` error.
    #[test]
    fn test_load_from_file() {
        let toml_content = r#"
environment = "development"

[oauth]
client_id = "client-file"
scopes = "openid email"
authorize_url = "https://auth.globus.org/v2/oauth2/authorize"
token_url = "https://auth.globus.org/v2/oauth2/token"

[server]
bind_addr = "127.0.0.1:3000"
base_url = "http://localhost:3000"
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let settings = load_from_file(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(settings.oauth.client_id, "client-file");
        assert!(settings.oauth.client_secret.is_none());
        assert_eq!(settings.environment, Environment::Development);

        let err = load_from_file(Some(PathBuf::from("/nonexistent/beamline.toml"))).unwrap_err();
        assert!(matches!(err, BeamlineError::Config(_)));
    }
}
