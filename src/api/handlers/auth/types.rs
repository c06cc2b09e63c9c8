//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use super::storage::Account;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Account summary returned to clients; never carries the password hash.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserSummary {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_verified: bool,
    pub profile_pic: Option<String>,
}

impl UserSummary {
    pub(crate) fn from_account(account: &Account) -> Self {
        Self {
            id: account.id.to_string(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            email: account.email.clone(),
            is_verified: account.is_verified,
            profile_pic: account.profile_pic.clone(),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserSummary,
}

/// Field-level validation errors keyed by input name.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct FieldErrorsResponse {
    pub errors: BTreeMap<String, String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AuthStatusResponse {
    pub authorization_status: String,
}

impl AuthStatusResponse {
    pub(crate) fn authorized() -> Self {
        Self {
            authorization_status: "Authorized".to_string(),
        }
    }

    pub(crate) fn unauthorized() -> Self {
        Self {
            authorization_status: "Unauthorized".to_string(),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerificationStatusResponse {
    pub verification_status: String,
}

impl VerificationStatusResponse {
    pub(crate) fn verified() -> Self {
        Self {
            verification_status: "Verified".to_string(),
        }
    }

    pub(crate) fn invalid() -> Self {
        Self {
            verification_status: "Invalid token".to_string(),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserDataResponse {
    pub success: bool,
    pub data: UserData,
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserData {
    pub user: UserSummary,
}
