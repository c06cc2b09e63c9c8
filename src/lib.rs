//! # Nanta (note taking service)
//!
//! `nanta` is the backend for a multi-tenant note taking application. It
//! registers accounts, authenticates credentials, and gates every resource
//! route (notes, profile, user info) behind a single session check.
//!
//! ## Sessions & Tokens
//!
//! Two signed token kinds exist, both minted with the same process-wide
//! secret and discriminated only by their `type` claim:
//!
//! - **Session tokens** (1 hour) prove an authenticated request belongs to an
//!   account. Carried in the `nanta-session` cookie, with an
//!   `Authorization: Bearer` fallback for non-browser clients.
//! - **Email verification tokens** (12 hours) prove control of the registered
//!   address. The last-issued token is also stored on the account row and a
//!   confirmation must match it byte for byte, which makes tokens single-use:
//!   confirming clears the stored copy, and re-requesting overwrites it.
//!
//! Every consumer checks the `type` claim explicitly, so a valid session
//! token is never accepted where a verification token is expected (and vice
//! versa).
//!
//! ## Error Policy
//!
//! Login failures collapse to one message ("Invalid email or password") and
//! session failures collapse to one `Unauthorized` status so callers cannot
//! probe which check failed. Unexpected failures are logged with full detail
//! server-side and surface as generic messages.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(GIT_COMMIT_HASH.len() >= 7);
    }
}
