//! Request and response bodies.
//!
//! Field names are snake_case on the wire; product bodies reuse the core
//! `Product`/`ProductDraft` types directly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use storekeep_core::models::auth::{PasswordChange, Registration, User, UserUpdate};

/// JSON error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable code, e.g. `invalid_credentials`.
    pub error: String,
    pub message: String,
    /// Per-field messages for validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// `POST /auth/login` body. `username` also accepts an email address and
/// may be sent as `email` or `identifier`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "email", alias = "identifier")]
    pub username: String,
    pub password: String,
    /// Persist the refresh cookie for the refresh token lifetime instead of
    /// the browser session.
    #[serde(default)]
    pub remember: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// `POST /auth/register` body. Every field is optional at the JSON level so
/// missing fields come back as per-field validation errors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub profile: Option<String>,
    pub role: Option<String>,
}

impl From<RegisterRequest> for Registration {
    fn from(body: RegisterRequest) -> Self {
        Registration {
            name: body.name.unwrap_or_default(),
            username: body.username.unwrap_or_default(),
            email: body.email.unwrap_or_default(),
            password: body.password.unwrap_or_default(),
            profile: body.profile,
            role: body.role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: User,
}

/// `PUT /users/{id}` body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub profile: Option<String>,
    pub role: Option<String>,
}

impl From<UpdateUserRequest> for UserUpdate {
    fn from(body: UpdateUserRequest) -> Self {
        UserUpdate {
            name: body.name.unwrap_or_default(),
            username: body.username.unwrap_or_default(),
            email: body.email.unwrap_or_default(),
            profile: body.profile,
            role: body.role,
        }
    }
}

/// `PUT /auth/password` body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

impl From<ChangePasswordRequest> for PasswordChange {
    fn from(body: ChangePasswordRequest) -> Self {
        PasswordChange {
            old_password: body.old_password.unwrap_or_default(),
            new_password: body.new_password.unwrap_or_default(),
        }
    }
}

/// `PUT /users/{id}/active` body.
#[derive(Debug, Clone, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}
