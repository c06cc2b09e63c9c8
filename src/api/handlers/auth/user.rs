//! Authenticated user info endpoints.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;

use super::principal::require_session;
use super::state::AuthState;
use super::types::{AuthStatusResponse, UserData, UserDataResponse};

/// Return the logged-in account's summary.
#[utoipa::path(
    get,
    path = "/user",
    responses(
        (status = 200, description = "Account summary", body = UserDataResponse),
        (status = 400, description = "Missing or invalid session", body = AuthStatusResponse)
    ),
    tag = "user"
)]
pub async fn get_user(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let principal = match require_session(&headers, &pool, &auth_state).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    let response = UserDataResponse {
        success: true,
        data: UserData {
            user: principal.summary(),
        },
        message: "User retrieved successfully!".to_string(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// Report whether the presented session is valid. Exists so frontends can
/// probe auth state without fetching the whole profile.
#[utoipa::path(
    get,
    path = "/user/authenticate",
    responses(
        (status = 200, description = "Session is valid", body = AuthStatusResponse),
        (status = 400, description = "Missing or invalid session", body = AuthStatusResponse)
    ),
    tag = "user"
)]
pub async fn authenticate(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    match require_session(&headers, &pool, &auth_state).await {
        Ok(_) => (StatusCode::OK, Json(AuthStatusResponse::authorized())).into_response(),
        Err(response) => response,
    }
}
