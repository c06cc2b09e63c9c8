//! Account registration.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::api::email::verification_email;

use super::rate_limit::{RateLimitAction, RateLimitDecision, RateLimitScope};
use super::state::AuthState;
use super::storage::{NewAccount, SignupOutcome, find_account_by_email, insert_account};
use super::types::{FieldErrorsResponse, RegisterRequest};
use super::utils::{extract_client_ip, hash_password, mint_verification_token, normalize_email};
use super::validate::{FieldErrors, validate_registration};

/// Register a new account.
///
/// The password is hashed, the verification token is minted and stored on
/// the row, and the row is created in a single insert; a failure leaves
/// nothing behind. Email delivery happens after the write and cannot fail
/// registration.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = String),
        (status = 400, description = "Field errors, including duplicate email", body = FieldErrorsResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let client_ip = extract_client_ip(&headers);
    if auth_state.rate_limiter().check(
        RateLimitScope::Ip(client_ip.as_deref()),
        RateLimitAction::Register,
    ) == RateLimitDecision::Limited
    {
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
    }

    let errors = validate_registration(&request);
    if !errors.is_empty() {
        return field_errors_response(errors);
    }

    let email = normalize_email(&request.email);

    // Uniqueness pre-check keeps the error in the field map; the unique
    // constraint below still catches concurrent registrations.
    match find_account_by_email(&pool, &email).await {
        Ok(Some(_)) => return duplicate_email_response(),
        Ok(None) => {}
        Err(err) => {
            error!("Failed to check email uniqueness: {err}");
            return registration_failed_response();
        }
    }

    let password_hash = match hash_password(&request.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash password: {err}");
            return registration_failed_response();
        }
    };

    // The id is minted here so the verification token can be bound to it
    // before the row exists.
    let account_id = Uuid::new_v4();
    let verification_token = match mint_verification_token(
        auth_state.token_secret(),
        account_id,
        &email,
        auth_state.config().verification_ttl_seconds(),
    ) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to mint verification token: {err}");
            return registration_failed_response();
        }
    };

    let account = NewAccount {
        id: account_id,
        first_name: request.first_name.trim().to_string(),
        last_name: request.last_name.trim().to_string(),
        email: email.clone(),
        password_hash,
        verification_token: verification_token.clone(),
    };

    match insert_account(&pool, &account).await {
        Ok(SignupOutcome::Created) => {}
        Ok(SignupOutcome::Conflict) => return duplicate_email_response(),
        Err(err) => {
            error!("Failed to insert account: {err}");
            return registration_failed_response();
        }
    }

    debug!("registered account {account_id}");

    // Fire-and-forget: the account row is already committed.
    let message = verification_email(
        auth_state.config().frontend_url(),
        &account.first_name,
        &account.last_name,
        &email,
        &verification_token,
    );
    crate::api::email::spawn_send(auth_state.mailer().clone(), message);

    (
        StatusCode::OK,
        "User registered successfully!".to_string(),
    )
        .into_response()
}

fn field_errors_response(errors: FieldErrors) -> axum::response::Response {
    (StatusCode::BAD_REQUEST, Json(FieldErrorsResponse { errors })).into_response()
}

fn duplicate_email_response() -> axum::response::Response {
    let mut errors = FieldErrors::new();
    errors.insert(
        "email".to_string(),
        "Email is already registered".to_string(),
    );
    field_errors_response(errors)
}

fn registration_failed_response() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Registration failed".to_string(),
    )
        .into_response()
}
