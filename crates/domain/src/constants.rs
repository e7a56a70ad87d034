//! Provider constants shared by the gateway and client runtimes.

/// Authorization endpoint of the external identity provider.
pub const AUTHORIZE_URL: &str = "https://auth.globus.org/v2/oauth2/authorize";

/// Token endpoint of the external identity provider.
pub const TOKEN_URL: &str = "https://auth.globus.org/v2/oauth2/token";

/// Resource server identity of the provider's own auth API. Credentials for
/// this resource server carry the session's refresh token and identity
/// claims; per-field cookie entries are derived from it.
pub const PRIMARY_RESOURCE_SERVER: &str = "auth.globus.org";

/// Scope string requested at login when none is configured: identity scopes
/// plus the transfer and compute resource-server scopes the dashboard
/// widgets need.
pub const DEFAULT_SCOPES: &str = "openid email profile \
    urn:globus:auth:scope:transfer.api.globus.org:all";

/// Path the provider redirects back to after authorization.
pub const CALLBACK_PATH: &str = "/auth/callback";

/// Sign-in page shown to unauthenticated users.
pub const SIGN_IN_PATH: &str = "/sign-in";
