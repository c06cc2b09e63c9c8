//! Email verification endpoints.

use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;
use identity_token::{TokenType, verify_hs256};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::api::email::{spawn_send, verification_email};

use super::principal::require_session;
use super::rate_limit::{RateLimitAction, RateLimitDecision, RateLimitScope};
use super::state::AuthState;
use super::storage::{confirm_verification, find_account_by_id, store_verification_token};
use super::types::VerificationStatusResponse;
use super::utils::{extract_client_ip, mint_verification_token};

/// Re-issue the verification token for the logged-in account.
///
/// The stored copy is overwritten, so any earlier token stops confirming
/// even if it has not expired. Resending is unlimited at this layer; the
/// pluggable rate limiter is the defense.
#[utoipa::path(
    post,
    path = "/user/verify-email/resend",
    responses(
        (status = 200, description = "Verification email issued", body = String),
        (status = 400, description = "Missing or invalid session")
    ),
    tag = "verification"
)]
pub async fn resend_verification(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let principal = match require_session(&headers, &pool, &auth_state).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    let client_ip = extract_client_ip(&headers);
    if auth_state.rate_limiter().check(
        RateLimitScope::Ip(client_ip.as_deref()),
        RateLimitAction::ResendVerification,
    ) == RateLimitDecision::Limited
    {
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
    }

    let token = match mint_verification_token(
        auth_state.token_secret(),
        principal.account_id,
        &principal.email,
        auth_state.config().verification_ttl_seconds(),
    ) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to mint verification token: {err}");
            return resend_failed_response();
        }
    };

    match store_verification_token(&pool, principal.account_id, &token).await {
        Ok(true) => {}
        Ok(false) => {
            // Account vanished between session resolution and the write.
            return resend_failed_response();
        }
        Err(err) => {
            error!("Failed to store verification token: {err}");
            return resend_failed_response();
        }
    }

    let message = verification_email(
        auth_state.config().frontend_url(),
        &principal.first_name,
        &principal.last_name,
        &principal.email,
        &token,
    );
    spawn_send(auth_state.mailer().clone(), message);

    (
        StatusCode::OK,
        "Verification email sent!".to_string(),
    )
        .into_response()
}

/// Confirm an email verification token presented in the path.
///
/// The signed token alone is necessary but not sufficient: it must also
/// equal the account's stored copy byte for byte. Wrong type, unknown
/// account, expiry, and stored-value mismatch all collapse into one
/// response.
#[utoipa::path(
    post,
    path = "/user/verify-email/{token}",
    params(("token" = String, Path, description = "Verification token from the email link")),
    responses(
        (status = 200, description = "Email verified", body = VerificationStatusResponse),
        (status = 400, description = "Invalid token", body = VerificationStatusResponse)
    ),
    tag = "verification"
)]
pub async fn verify_email(
    Path(token): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let client_ip = extract_client_ip(&headers);
    if auth_state.rate_limiter().check(
        RateLimitScope::Ip(client_ip.as_deref()),
        RateLimitAction::VerifyEmail,
    ) == RateLimitDecision::Limited
    {
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
    }

    let claims = match verify_hs256(&token, auth_state.token_secret(), Utc::now().timestamp()) {
        Ok(claims) => claims,
        Err(err) => {
            debug!("verification token rejected: {err}");
            return invalid_token_response();
        }
    };

    // A session token must never verify an email.
    if claims.kind != TokenType::EmailVerification {
        debug!("verification check rejected token of type {:?}", claims.kind);
        return invalid_token_response();
    }

    let Ok(account_id) = Uuid::parse_str(&claims.sub) else {
        return invalid_token_response();
    };

    let account = match find_account_by_id(&pool, account_id).await {
        Ok(Some(account)) => account,
        Ok(None) => return invalid_token_response(),
        Err(err) => {
            error!("Failed to resolve account for verification: {err}");
            return verification_failed_response();
        }
    };

    // The stored copy is the source of truth; a reissued or already consumed
    // token fails here even though its signature is valid.
    if account.verification_token.as_deref() != Some(token.as_str()) {
        return invalid_token_response();
    }

    match confirm_verification(&pool, account_id, &token).await {
        Ok(true) => (
            StatusCode::OK,
            Json(VerificationStatusResponse::verified()),
        )
            .into_response(),
        // Lost the race against a concurrent confirm or resend.
        Ok(false) => invalid_token_response(),
        Err(err) => {
            error!("Failed to confirm verification: {err}");
            verification_failed_response()
        }
    }
}

fn resend_failed_response() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Failed to send verification email".to_string(),
    )
        .into_response()
}

fn invalid_token_response() -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(VerificationStatusResponse::invalid()),
    )
        .into_response()
}

fn verification_failed_response() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Verification failed".to_string(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use axum::body::to_bytes;
    use identity_token::{IdentityClaims, sign_hs256};
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;

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

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool")
    }

    async fn assert_invalid_token(response: axum::response::Response) -> Result<()> {
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let value: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(
            value,
            serde_json::json!({ "verification_status": "Invalid token" })
        );
        Ok(())
    }

    #[tokio::test]
    async fn garbage_token_is_invalid() -> Result<()> {
        let response = verify_email(
            Path("not-a-token".to_string()),
            HeaderMap::new(),
            Extension(lazy_pool()),
            Extension(test_state()),
        )
        .await
        .into_response();
        assert_invalid_token(response).await
    }

    #[tokio::test]
    async fn session_token_is_not_a_verification_token() -> Result<()> {
        // Valid signature and unexpired, but the wrong type; rejected before
        // any directory lookup.
        let now = Utc::now().timestamp();
        let claims = IdentityClaims {
            kind: TokenType::Session,
            sub: Uuid::new_v4().to_string(),
            email: "john@x.com".to_string(),
            iat: now,
            exp: now + 3600,
        };
        let token = sign_hs256(SECRET.as_bytes(), &claims)?;

        let response = verify_email(
            Path(token),
            HeaderMap::new(),
            Extension(lazy_pool()),
            Extension(test_state()),
        )
        .await
        .into_response();
        assert_invalid_token(response).await
    }

    #[tokio::test]
    async fn expired_verification_token_is_invalid() -> Result<()> {
        let now = Utc::now().timestamp();
        let claims = IdentityClaims {
            kind: TokenType::EmailVerification,
            sub: Uuid::new_v4().to_string(),
            email: "john@x.com".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = sign_hs256(SECRET.as_bytes(), &claims)?;

        let response = verify_email(
            Path(token),
            HeaderMap::new(),
            Extension(lazy_pool()),
            Extension(test_state()),
        )
        .await
        .into_response();
        assert_invalid_token(response).await
    }

    #[tokio::test]
    async fn resend_requires_a_session() {
        let response = resend_verification(
            HeaderMap::new(),
            Extension(lazy_pool()),
            Extension(test_state()),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
