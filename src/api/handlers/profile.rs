//! Profile updates for the logged-in account.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use super::auth::principal::require_session;
use super::auth::state::AuthState;
use super::auth::storage::{UpdateOutcome, update_account};
use super::auth::types::UserSummary;
use super::auth::hash_password;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ProfileUpdateRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub profile_pic: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ProfileUpdateResponse {
    pub message: String,
    pub user: UserSummary,
}

/// Apply a partial profile update. Only provided fields change; a password
/// change re-applies the same length rule as registration and re-hashes.
#[utoipa::path(
    put,
    path = "/profile/update-info",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileUpdateResponse),
        (status = 400, description = "Invalid update or invalid session"),
        (status = 404, description = "Account no longer exists")
    ),
    tag = "profile"
)]
pub async fn update_profile(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ProfileUpdateRequest>>,
) -> impl IntoResponse {
    let principal = match require_session(&headers, &pool, &auth_state).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    let request: ProfileUpdateRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let first_name = normalize_optional(request.first_name);
    let last_name = normalize_optional(request.last_name);
    let email = normalize_optional(request.email).map(|email| email.to_lowercase());
    let profile_pic = request.profile_pic;

    let password_hash = match request.password.filter(|password| !password.is_empty()) {
        Some(password) if password.len() < 8 => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "Password must be at least 8 characters." })),
            )
                .into_response();
        }
        Some(password) => match hash_password(&password) {
            Ok(hash) => Some(hash),
            Err(err) => {
                error!("Failed to hash password: {err}");
                return internal_error_response();
            }
        },
        None => None,
    };

    if first_name.is_none()
        && last_name.is_none()
        && email.is_none()
        && password_hash.is_none()
        && profile_pic.is_none()
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "No updates provided." })),
        )
            .into_response();
    }

    match update_account(
        &pool,
        principal.account_id,
        first_name,
        last_name,
        email,
        password_hash,
        profile_pic,
    )
    .await
    {
        Ok(UpdateOutcome::Updated(account)) => (
            StatusCode::OK,
            Json(ProfileUpdateResponse {
                message: "Profile updated successfully!".to_string(),
                user: UserSummary::from_account(&account),
            }),
        )
            .into_response(),
        Ok(UpdateOutcome::EmailTaken) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Email is already registered" })),
        )
            .into_response(),
        Ok(UpdateOutcome::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "User not found." })),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to update profile: {err}");
            internal_error_response()
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn internal_error_response() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "message": "Internal server error. Please try again later.",
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;

    use crate::api::email::LogEmailSender;
    use crate::api::handlers::auth::AuthConfig;
    use crate::api::handlers::auth::rate_limit::NoopRateLimiter;

    fn test_state() -> Arc<AuthState> {
        Arc::new(AuthState::new(
            AuthConfig::new("https://notes.nanta.dev".to_string()),
            SecretString::from("test-signing-secret".to_string()),
            Arc::new(NoopRateLimiter),
            Arc::new(LogEmailSender),
        ))
    }

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool")
    }

    #[test]
    fn normalize_optional_drops_blank_values() {
        assert_eq!(normalize_optional(Some("  ".to_string())), None);
        assert_eq!(
            normalize_optional(Some(" Jane ".to_string())),
            Some("Jane".to_string())
        );
        assert_eq!(normalize_optional(None), None);
    }

    #[tokio::test]
    async fn update_requires_a_session() {
        let response = update_profile(
            HeaderMap::new(),
            Extension(lazy_pool()),
            Extension(test_state()),
            None,
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
