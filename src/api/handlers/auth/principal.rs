//! Session validation and principal binding.
//!
//! `require_session` is the single authorization gate: every protected route
//! (notes, profile, user info) calls it before touching any resource. It
//! performs exactly one directory read and never writes, so it is safe to
//! call concurrently and repeatedly.

use axum::{
    Json,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use identity_token::{TokenType, verify_hs256};
use sqlx::PgPool;
use tracing::{debug, error};
use uuid::Uuid;

use super::session::extract_session_token;
use super::state::AuthState;
use super::storage::{Account, find_account_by_id};
use super::types::{AuthStatusResponse, UserSummary};

/// Authenticated account bound to a single request. Produced exclusively by
/// `require_session`; downstream code never re-derives identity from raw
/// claims.
#[derive(Clone, Debug)]
pub(crate) struct Principal {
    pub(crate) account_id: Uuid,
    pub(crate) email: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) is_verified: bool,
    pub(crate) profile_pic: Option<String>,
}

impl Principal {
    fn from_account(account: Account) -> Self {
        Self {
            account_id: account.id,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
            is_verified: account.is_verified,
            profile_pic: account.profile_pic,
        }
    }

    pub(crate) fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.account_id.to_string(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            is_verified: self.is_verified,
            profile_pic: self.profile_pic.clone(),
        }
    }
}

/// Uniform failure for every session check. Missing, malformed, expired,
/// wrong-type, and unknown-account tokens are indistinguishable to callers.
pub(crate) fn unauthorized_response() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(AuthStatusResponse::unauthorized()),
    )
        .into_response()
}

/// Resolve the session artifact into a `Principal`, or fail with the uniform
/// unauthorized response.
///
/// The checks run in a fixed order: extract, decode, type-check, resolve.
/// Only directory I/O errors break the pattern and surface as a 500.
pub(crate) async fn require_session(
    headers: &HeaderMap,
    pool: &PgPool,
    state: &AuthState,
) -> Result<Principal, Response> {
    let Some(token) = extract_session_token(headers) else {
        return Err(unauthorized_response());
    };

    let claims = match verify_hs256(&token, state.token_secret(), Utc::now().timestamp()) {
        Ok(claims) => claims,
        Err(err) => {
            debug!("session token rejected: {err}");
            return Err(unauthorized_response());
        }
    };

    // A verification token is never a session, no matter how fresh.
    if claims.kind != TokenType::Session {
        debug!("session check rejected token of type {:?}", claims.kind);
        return Err(unauthorized_response());
    }

    let Ok(account_id) = Uuid::parse_str(&claims.sub) else {
        debug!("session token carried a non-uuid subject");
        return Err(unauthorized_response());
    };

    match find_account_by_id(pool, account_id).await {
        Ok(Some(account)) => Ok(Principal::from_account(account)),
        // Accounts removed since issuance fail like any other bad token.
        Ok(None) => Err(unauthorized_response()),
        Err(err) => {
            error!("Failed to resolve session principal: {err}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authorization failed".to_string(),
            )
                .into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use identity_token::{IdentityClaims, sign_hs256};
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;

    use crate::api::email::LogEmailSender;
    use crate::api::handlers::auth::rate_limit::NoopRateLimiter;
    use crate::api::handlers::auth::state::AuthConfig;

    const SECRET: &str = "test-signing-secret";

    fn test_state() -> Arc<AuthState> {
        Arc::new(AuthState::new(
            AuthConfig::new("https://notes.nanta.dev".to_string()),
            SecretString::from(SECRET.to_string()),
            Arc::new(NoopRateLimiter),
            Arc::new(LogEmailSender),
        ))
    }

    fn lazy_pool() -> sqlx::PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool")
    }

    fn cookie_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_str(&format!("nanta-session={token}")).expect("cookie header"),
        );
        headers
    }

    fn signed_token(kind: TokenType, exp_offset: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = IdentityClaims {
            kind,
            sub: Uuid::new_v4().to_string(),
            email: "john@x.com".to_string(),
            iat: now,
            exp: now + exp_offset,
        };
        sign_hs256(SECRET.as_bytes(), &claims).expect("sign token")
    }

    #[tokio::test]
    async fn missing_artifact_is_unauthorized() {
        let result = require_session(&HeaderMap::new(), &lazy_pool(), &test_state()).await;
        let response = result.err().expect("expected failure");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let headers = cookie_headers("not-a-token");
        let result = require_session(&headers, &lazy_pool(), &test_state()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn expired_token_is_unauthorized() {
        let headers = cookie_headers(&signed_token(TokenType::Session, -10));
        let result = require_session(&headers, &lazy_pool(), &test_state()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn verification_token_is_not_a_session() {
        // Valid signature, unexpired, but the wrong type; rejected before
        // any directory lookup.
        let headers = cookie_headers(&signed_token(TokenType::EmailVerification, 3600));
        let result = require_session(&headers, &lazy_pool(), &test_state()).await;
        let response = result.err().expect("expected failure");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
