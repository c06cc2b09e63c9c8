//! Identity endpoints: registration, login, sessions, email verification.
//!
//! Flow Overview:
//! 1) `/register` creates the account and issues the first verification token.
//! 2) `/login` checks credentials and mints the session token.
//! 3) `require_session` gates every protected route and binds the principal.
//! 4) `/user/verify-email/*` re-issues and confirms verification tokens.

pub mod login;
pub mod principal;
pub mod rate_limit;
pub mod register;
pub mod session;
pub mod state;
pub(crate) mod storage;
pub mod types;
pub mod user;
mod utils;
mod validate;
pub mod verification;

pub use state::{AuthConfig, AuthState};

pub(crate) use utils::hash_password;
