//! OpenAPI document assembly.
//!
//! Register new endpoints here so they show up in the generated spec served
//! under `/docs`.

use utoipa::OpenApi;

use super::handlers::{auth, health, notes, profile};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "nanta",
        description = "Multi-tenant note taking service",
        license(name = "BSD-3-Clause")
    ),
    paths(
        health::health,
        auth::register::register,
        auth::login::login,
        auth::session::logout,
        auth::user::get_user,
        auth::user::authenticate,
        auth::verification::resend_verification,
        auth::verification::verify_email,
        notes::create_note,
        notes::get_notes,
        notes::update_note,
        notes::delete_note,
        profile::update_profile,
    ),
    components(schemas(
        health::Health,
        auth::types::RegisterRequest,
        auth::types::LoginRequest,
        auth::types::LoginResponse,
        auth::types::UserSummary,
        auth::types::UserDataResponse,
        auth::types::UserData,
        auth::types::FieldErrorsResponse,
        auth::types::AuthStatusResponse,
        auth::types::VerificationStatusResponse,
        notes::NotePayload,
        notes::NoteSummary,
        notes::NotesResponse,
        profile::ProfileUpdateRequest,
        profile::ProfileUpdateResponse,
    )),
    tags(
        (name = "auth", description = "Registration, login and sessions"),
        (name = "user", description = "Logged-in account info"),
        (name = "verification", description = "Email ownership proof"),
        (name = "notes", description = "Note storage"),
        (name = "profile", description = "Profile updates"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_all_routes() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        for path in [
            "/health",
            "/register",
            "/login",
            "/logout",
            "/user",
            "/user/authenticate",
            "/user/verify-email/resend",
            "/user/verify-email/{token}",
            "/notes",
            "/notes/create",
            "/notes/{id}",
            "/profile/update-info",
        ] {
            assert!(paths.contains_key(path), "missing path: {path}");
        }
    }
}
