use crate::{
    api,
    auth::{AuthConfig, AuthState},
};
use anyhow::{anyhow, Result};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::warn;

/// Known insecure secret for local development only. Production startup
/// refuses to run without an explicit secret (see `commands::validate`).
const DEV_SESSION_SECRET: &str = "dev-secret-change-me";

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub session_secret: Option<String>,
    pub session_ttl_seconds: i64,
    pub production: bool,
    pub frontend_base_url: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if configuration is inconsistent or the server fails to
/// start.
pub async fn execute(args: Args) -> Result<()> {
    let secret = match args.session_secret {
        Some(secret) => SecretString::from(secret),
        None => {
            if args.production {
                // commands::validate already rejects this; keep the check so
                // the action cannot be driven into it from another path.
                return Err(anyhow!(
                    "A session secret is required in production mode"
                ));
            }
            warn!("No session secret configured; using the insecure development default");
            SecretString::from(DEV_SESSION_SECRET.to_string())
        }
    };

    let auth_config = AuthConfig::new(args.frontend_base_url)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_cookie_secure(args.production);

    let auth_state = Arc::new(AuthState::new(auth_config, &secret));

    api::new(args.port, args.dsn, auth_state).await
}
