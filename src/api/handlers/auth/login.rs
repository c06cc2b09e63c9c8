//! Credential login.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error};

use super::rate_limit::{RateLimitAction, RateLimitDecision, RateLimitScope};
use super::session::session_cookie;
use super::state::AuthState;
use super::storage::find_account_by_email;
use super::types::{FieldErrorsResponse, LoginRequest, LoginResponse, UserSummary};
use super::utils::{extract_client_ip, mint_session_token, normalize_email, verify_password};
use super::validate::validate_login;

/// Authenticate credentials and mint a session token.
///
/// Every failure collapses into the same message so callers cannot tell
/// whether the email or the password was wrong.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session established", body = LoginResponse),
        (status = 400, description = "Invalid email or password", body = FieldErrorsResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return invalid_credentials_response(),
    };

    let client_ip = extract_client_ip(&headers);
    if auth_state.rate_limiter().check(
        RateLimitScope::Ip(client_ip.as_deref()),
        RateLimitAction::Login,
    ) == RateLimitDecision::Limited
    {
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
    }

    let errors = validate_login(&request);
    if !errors.is_empty() {
        debug!("login input rejected: {:?}", errors.keys());
        return invalid_credentials_response();
    }

    let email = normalize_email(&request.email);
    if auth_state
        .rate_limiter()
        .check(RateLimitScope::Email(&email), RateLimitAction::Login)
        == RateLimitDecision::Limited
    {
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
    }

    let account = match find_account_by_email(&pool, &email).await {
        Ok(Some(account)) => account,
        Ok(None) => return invalid_credentials_response(),
        Err(err) => {
            error!("Failed to lookup account for login: {err}");
            return login_failed_response();
        }
    };

    if !verify_password(&request.password, &account.password_hash) {
        return invalid_credentials_response();
    }

    let token = match mint_session_token(
        auth_state.token_secret(),
        account.id,
        &account.email,
        auth_state.config().session_ttl_seconds(),
    ) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to mint session token: {err}");
            return login_failed_response();
        }
    };

    // The token rides in the response body too, for clients that prefer the
    // bearer header over cookies.
    let mut response_headers = HeaderMap::new();
    match session_cookie(auth_state.config(), &token) {
        Ok(cookie) => {
            response_headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => {
            error!("Failed to build session cookie: {err}");
            return login_failed_response();
        }
    }

    let response = LoginResponse {
        message: "User logged in successfully!".to_string(),
        token,
        user: UserSummary::from_account(&account),
    };
    (StatusCode::OK, response_headers, Json(response)).into_response()
}

fn invalid_credentials_response() -> axum::response::Response {
    let mut errors = std::collections::BTreeMap::new();
    errors.insert(
        "login".to_string(),
        "Invalid email or password".to_string(),
    );
    (StatusCode::BAD_REQUEST, Json(FieldErrorsResponse { errors })).into_response()
}

fn login_failed_response() -> axum::response::Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Login failed".to_string()).into_response()
}
