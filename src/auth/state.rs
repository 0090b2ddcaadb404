//! Auth configuration and shared handler state.

use secrecy::SecretString;

use super::token::TokenCodec;

pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_LOGIN_PATH: &str = "/login";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    session_ttl_seconds: i64,
    cookie_secure: bool,
    login_path: String,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            cookie_secure: false,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    /// `Secure` cookies are tied to the explicit production flag, not
    /// guessed from URLs.
    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn with_login_path(mut self, path: String) -> Self {
        self.login_path = path;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }
}

/// Per-process auth state injected into handlers as an extension.
pub struct AuthState {
    config: AuthConfig,
    codec: TokenCodec,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, secret: &SecretString) -> Self {
        let codec = TokenCodec::new(secret, config.session_ttl_seconds());
        Self { config, codec }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }
}
