//! Small helpers for auth validation, password hashing, and token minting.

use anyhow::{Context, Result, anyhow};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use identity_token::{IdentityClaims, TokenType, sign_hs256};
use regex::Regex;
use uuid::Uuid;

/// Normalize an email for lookup/uniqueness checks.
pub(super) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(super) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Hash a password with a fresh random salt.
pub(crate) fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {err}"))?;
    Ok(hash.to_string())
}

/// Check a password against a stored hash. Parse failures count as a
/// mismatch so callers keep a single failure path.
pub(super) fn verify_password(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Mint a session token bound to an account.
pub(super) fn mint_session_token(
    secret: &[u8],
    account_id: Uuid,
    email: &str,
    ttl_seconds: i64,
) -> Result<String> {
    mint_token(secret, TokenType::Session, account_id, email, ttl_seconds)
}

/// Mint an email verification token bound to an account. The caller stores
/// the returned string on the account row; confirmation later requires an
/// exact match against that stored copy.
pub(super) fn mint_verification_token(
    secret: &[u8],
    account_id: Uuid,
    email: &str,
    ttl_seconds: i64,
) -> Result<String> {
    mint_token(
        secret,
        TokenType::EmailVerification,
        account_id,
        email,
        ttl_seconds,
    )
}

fn mint_token(
    secret: &[u8],
    kind: TokenType,
    account_id: Uuid,
    email: &str,
    ttl_seconds: i64,
) -> Result<String> {
    let now = Utc::now().timestamp();
    let claims = IdentityClaims {
        kind,
        sub: account_id.to_string(),
        email: email.to_string(),
        iat: now,
        exp: now + ttl_seconds,
    };
    sign_hs256(secret, &claims).context("failed to sign identity token")
}

pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

/// Extract a client IP for rate limiting from common proxy headers.
pub(super) fn extract_client_ip(headers: &axum::http::HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};
    use identity_token::verify_hs256;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    const SECRET: &[u8] = b"test-signing-secret";

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" John@X.COM "), "john@x.com");
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
    }

    #[test]
    fn password_hash_round_trip() -> anyhow::Result<()> {
        let hash = hash_password("password123")?;
        assert!(verify_password("password123", &hash));
        assert!(!verify_password("password124", &hash));
        Ok(())
    }

    #[test]
    fn verify_password_rejects_garbage_hash() {
        assert!(!verify_password("password123", "not-a-phc-string"));
    }

    #[test]
    fn minted_session_token_verifies_with_type() -> anyhow::Result<()> {
        let id = Uuid::new_v4();
        let token = mint_session_token(SECRET, id, "john@x.com", 3600)?;
        let claims = verify_hs256(&token, SECRET, Utc::now().timestamp())?;
        assert_eq!(claims.kind, identity_token::TokenType::Session);
        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.email, "john@x.com");
        assert_eq!(claims.exp - claims.iat, 3600);
        Ok(())
    }

    #[test]
    fn minted_verification_token_carries_its_own_type() -> anyhow::Result<()> {
        let token = mint_verification_token(SECRET, Uuid::new_v4(), "john@x.com", 43_200)?;
        let claims = verify_hs256(&token, SECRET, Utc::now().timestamp())?;
        assert_eq!(claims.kind, identity_token::TokenType::EmailVerification);
        Ok(())
    }

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn is_unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }

    #[test]
    fn extract_client_ip_prefers_forwarded() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 5.6.7.8"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(extract_client_ip(&headers), Some("1.2.3.4".to_string()));
    }

    #[test]
    fn extract_client_ip_none_when_missing() {
        let headers = HeaderMap::new();
        assert_eq!(extract_client_ip(&headers), None);
    }
}
