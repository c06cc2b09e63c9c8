//! Note storage endpoints.
//!
//! Flow Overview:
//! 1) Resolve the principal through the session gate.
//! 2) Run the query scoped to the principal's id.
//! 3) A note owned by someone else is indistinguishable from a missing one.

use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use super::auth::principal::require_session;
use super::auth::state::AuthState;

const DEFAULT_TITLE: &str = "Blank Note";

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct NotePayload {
    pub title: Option<String>,
    pub content: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct NoteSummary {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct NotesResponse {
    pub notes: Vec<NoteSummary>,
    pub message: String,
}

/// Create a note for the logged-in account.
#[utoipa::path(
    post,
    path = "/notes/create",
    request_body = NotePayload,
    responses(
        (status = 200, description = "Note created", body = String),
        (status = 400, description = "Missing content or invalid session")
    ),
    tag = "notes"
)]
pub async fn create_note(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<NotePayload>>,
) -> impl IntoResponse {
    let principal = match require_session(&headers, &pool, &auth_state).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    let note: NotePayload = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };
    if note.content.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Please enter note content" })),
        )
            .into_response();
    }

    // An absent or blank title falls back to the default.
    let title = note
        .title
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    match insert_note(&pool, principal.account_id, &title, note.content.trim()).await {
        Ok(()) => (StatusCode::OK, "Note created successfully!".to_string()).into_response(),
        Err(err) => {
            error!("Failed to insert note: {err}");
            internal_error_response()
        }
    }
}

/// List the account's notes, most recently updated first.
#[utoipa::path(
    get,
    path = "/notes",
    responses(
        (status = 200, description = "Notes for the logged-in account", body = NotesResponse),
        (status = 400, description = "Missing or invalid session")
    ),
    tag = "notes"
)]
pub async fn get_notes(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let principal = match require_session(&headers, &pool, &auth_state).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match fetch_notes(&pool, principal.account_id).await {
        Ok(notes) => (
            StatusCode::OK,
            Json(NotesResponse {
                notes,
                message: "Notes retrieved successfully!".to_string(),
            }),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to fetch notes: {err}");
            internal_error_response()
        }
    }
}

/// Update a note by id, only when the principal owns it.
#[utoipa::path(
    put,
    path = "/notes/{id}",
    params(("id" = String, Path, description = "Note id")),
    request_body = NotePayload,
    responses(
        (status = 200, description = "Note updated", body = String),
        (status = 404, description = "Note not found or owned by someone else")
    ),
    tag = "notes"
)]
pub async fn update_note(
    Path(id): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<NotePayload>>,
) -> impl IntoResponse {
    let principal = match require_session(&headers, &pool, &auth_state).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    let note: NotePayload = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    // A malformed id cannot match any note; same response as not-owned.
    let Ok(note_id) = Uuid::parse_str(id.trim()) else {
        return not_found_response();
    };

    match modify_note(&pool, note_id, principal.account_id, note.title, &note.content).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({ "message": "Note updated successfully!" })),
        )
            .into_response(),
        Ok(false) => not_found_response(),
        Err(err) => {
            error!("Failed to update note: {err}");
            internal_error_response()
        }
    }
}

/// Delete a note by id, only when the principal owns it.
#[utoipa::path(
    delete,
    path = "/notes/{id}",
    params(("id" = String, Path, description = "Note id")),
    responses(
        (status = 200, description = "Note deleted", body = String),
        (status = 404, description = "Note not found or owned by someone else")
    ),
    tag = "notes"
)]
pub async fn delete_note(
    Path(id): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let principal = match require_session(&headers, &pool, &auth_state).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    let Ok(note_id) = Uuid::parse_str(id.trim()) else {
        return not_found_response();
    };

    match remove_note(&pool, note_id, principal.account_id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({ "message": "Note deleted successfully!" })),
        )
            .into_response(),
        Ok(false) => not_found_response(),
        Err(err) => {
            error!("Failed to delete note: {err}");
            internal_error_response()
        }
    }
}

fn not_found_response() -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Note not found or unauthorized!" })),
    )
        .into_response()
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

async fn insert_note(
    pool: &PgPool,
    user_id: Uuid,
    title: &str,
    content: &str,
) -> Result<(), sqlx::Error> {
    let query = "INSERT INTO notes (user_id, title, content) VALUES ($1, $2, $3)";
    sqlx::query(query)
        .bind(user_id)
        .bind(title)
        .bind(content)
        .execute(pool)
        .await?;
    Ok(())
}

async fn fetch_notes(pool: &PgPool, user_id: Uuid) -> Result<Vec<NoteSummary>, sqlx::Error> {
    let query = r#"
        SELECT
            id::text AS id,
            title,
            content,
            to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
            to_char(updated_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at
        FROM notes
        WHERE user_id = $1
        ORDER BY updated_at DESC
    "#;
    let rows = sqlx::query(query).bind(user_id).fetch_all(pool).await?;
    Ok(rows
        .into_iter()
        .map(|row| NoteSummary {
            id: row.get("id"),
            title: row.get("title"),
            content: row.get("content"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
        .collect())
}

async fn modify_note(
    pool: &PgPool,
    note_id: Uuid,
    user_id: Uuid,
    title: Option<String>,
    content: &str,
) -> Result<bool, sqlx::Error> {
    let query = r"
        UPDATE notes
        SET title = COALESCE($3, title),
            content = $4,
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
    ";
    let result = sqlx::query(query)
        .bind(note_id)
        .bind(user_id)
        .bind(title)
        .bind(content)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn remove_note(pool: &PgPool, note_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let query = "DELETE FROM notes WHERE id = $1 AND user_id = $2";
    let result = sqlx::query(query)
        .bind(note_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
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

    #[tokio::test]
    async fn notes_routes_require_a_session() {
        let response = get_notes(
            HeaderMap::new(),
            Extension(lazy_pool()),
            Extension(test_state()),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = create_note(
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
