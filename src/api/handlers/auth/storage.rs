//! Database adapter for account state.
//!
//! Every account read/write in the service goes through this module. The
//! directory guarantees atomic single-row create/update semantics; nothing
//! here needs multi-statement transactions.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::Instrument;
use uuid::Uuid;

use super::utils::is_unique_violation;

/// Full account row. Internal to the API layer; responses use
/// `UserSummary` so the password hash never leaves the process.
#[derive(Debug, Clone)]
pub(crate) struct Account {
    pub(crate) id: Uuid,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) email: String,
    pub(crate) password_hash: String,
    pub(crate) is_verified: bool,
    pub(crate) verification_token: Option<String>,
    pub(crate) profile_pic: Option<String>,
}

/// New account to persist. The id is minted by the caller so tokens can be
/// bound to it before the row exists.
#[derive(Debug)]
pub(super) struct NewAccount {
    pub(super) id: Uuid,
    pub(super) first_name: String,
    pub(super) last_name: String,
    pub(super) email: String,
    pub(super) password_hash: String,
    pub(super) verification_token: String,
}

/// Outcome when attempting to create a new account.
#[derive(Debug)]
pub(super) enum SignupOutcome {
    Created,
    Conflict,
}

/// Outcome of a profile update.
#[derive(Debug)]
pub(crate) enum UpdateOutcome {
    Updated(Account),
    EmailTaken,
    NotFound,
}

const ACCOUNT_COLUMNS: &str = r"
    id, first_name, last_name, email, password_hash,
    is_verified, verification_token, profile_pic
";

fn account_from_row(row: &PgRow) -> Account {
    Account {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        is_verified: row.get("is_verified"),
        verification_token: row.get("verification_token"),
        profile_pic: row.get("profile_pic"),
    }
}

/// Look up an account by normalized email.
pub(super) async fn find_account_by_email(pool: &PgPool, email: &str) -> Result<Option<Account>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE email = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup account by email")?;

    Ok(row.as_ref().map(account_from_row))
}

/// Look up an account by id (session and verification principal resolution).
pub(crate) async fn find_account_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Account>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup account by id")?;

    Ok(row.as_ref().map(account_from_row))
}

/// Create an account in one atomic insert. A duplicate email surfaces as
/// `Conflict` via the unique constraint rather than a pre-read, so two
/// concurrent registrations cannot both succeed.
pub(super) async fn insert_account(pool: &PgPool, account: &NewAccount) -> Result<SignupOutcome> {
    let query = r"
        INSERT INTO users
            (id, first_name, last_name, email, password_hash, verification_token)
        VALUES ($1, $2, $3, $4, $5, $6)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(account.id)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.verification_token)
        .execute(pool)
        .instrument(span)
        .await;

    match result {
        Ok(_) => Ok(SignupOutcome::Created),
        Err(err) if is_unique_violation(&err) => Ok(SignupOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert account"),
    }
}

/// Overwrite the stored verification token. The previous token, confirmed or
/// not, stops matching from this point on; concurrent resends race and the
/// last writer wins.
pub(super) async fn store_verification_token(
    pool: &PgPool,
    id: Uuid,
    token: &str,
) -> Result<bool> {
    let query = r"
        UPDATE users
        SET verification_token = $2,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(id)
        .bind(token)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to store verification token")?;
    Ok(result.rows_affected() > 0)
}

/// Flip the account to verified if and only if the presented token equals
/// the stored copy byte for byte. Clearing the column in the same statement
/// is what makes tokens single-use: a replay no longer matches anything.
pub(super) async fn confirm_verification(pool: &PgPool, id: Uuid, token: &str) -> Result<bool> {
    let query = r"
        UPDATE users
        SET verification_token = NULL,
            is_verified = TRUE,
            updated_at = NOW()
        WHERE id = $1
          AND verification_token = $2
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(id)
        .bind(token)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to confirm verification token")?;
    Ok(result.rows_affected() > 0)
}

/// Partial profile update. Absent fields keep their current value.
pub(crate) async fn update_account(
    pool: &PgPool,
    id: Uuid,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    password_hash: Option<String>,
    profile_pic: Option<String>,
) -> Result<UpdateOutcome> {
    let query = format!(
        r"
        UPDATE users
        SET first_name = COALESCE($2, first_name),
            last_name = COALESCE($3, last_name),
            email = COALESCE($4, email),
            password_hash = COALESCE($5, password_hash),
            profile_pic = COALESCE($6, profile_pic),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {ACCOUNT_COLUMNS}
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query.as_str()
    );
    let result = sqlx::query(&query)
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(password_hash)
        .bind(profile_pic)
        .fetch_optional(pool)
        .instrument(span)
        .await;

    match result {
        Ok(Some(row)) => Ok(UpdateOutcome::Updated(account_from_row(&row))),
        Ok(None) => Ok(UpdateOutcome::NotFound),
        Err(err) if is_unique_violation(&err) => Ok(UpdateOutcome::EmailTaken),
        Err(err) => Err(err).context("failed to update account"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
    use std::time::Duration;

    fn unreachable_pool() -> PgPool {
        let options = PgConnectOptions::new()
            .host("127.0.0.1")
            .port(1)
            .username("invalid")
            .database("invalid")
            .ssl_mode(PgSslMode::Disable);
        PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy_with(options)
    }

    #[test]
    fn signup_outcome_debug_names() {
        assert_eq!(format!("{:?}", SignupOutcome::Created), "Created");
        assert_eq!(format!("{:?}", SignupOutcome::Conflict), "Conflict");
    }

    #[tokio::test]
    async fn find_account_by_email_fails_without_db() {
        let pool = unreachable_pool();
        let result = find_account_by_email(&pool, "john@x.com").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn confirm_verification_fails_without_db() {
        let pool = unreachable_pool();
        let result = confirm_verification(&pool, Uuid::new_v4(), "token").await;
        assert!(result.is_err());
    }
}
