use crate::api::{
    self, email::LogEmailSender,
    handlers::auth::{AuthConfig, AuthState, rate_limit::NoopRateLimiter},
};
use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::debug;

pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub token_secret: String,
    pub frontend_url: String,
    pub session_ttl_seconds: i64,
    pub verification_ttl_seconds: i64,
    pub secure_cookies: bool,
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("port", &self.port)
            .field("dsn", &self.dsn)
            .field("token_secret", &"***")
            .field("frontend_url", &self.frontend_url)
            .field("session_ttl_seconds", &self.session_ttl_seconds)
            .field("verification_ttl_seconds", &self.verification_ttl_seconds)
            .field("secure_cookies", &self.secure_cookies)
            .finish()
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    let config = AuthConfig::new(args.frontend_url)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_verification_ttl_seconds(args.verification_ttl_seconds)
        .with_secure_cookies(args.secure_cookies);

    let auth_state = Arc::new(AuthState::new(
        config,
        SecretString::from(args.token_secret),
        Arc::new(NoopRateLimiter),
        Arc::new(LogEmailSender),
    ));

    api::new(args.port, args.dsn, auth_state).await
}
