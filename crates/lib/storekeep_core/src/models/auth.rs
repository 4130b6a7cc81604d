//! Authentication domain models.
//!
//! These are internal domain models, distinct from the API request/response
//! types in `storekeep_api::models`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile assigned when registration leaves it blank.
pub const DEFAULT_PROFILE: &str = "OPERADOR";
/// Role assigned when registration leaves it blank.
pub const DEFAULT_ROLE: &str = "NO-ROLE";
/// Profile that may manage other users' records.
pub const ADMIN_PROFILE: &str = "ADM";

/// Domain user. Carries no password material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
    pub profile: String,
    pub role: String,
    pub active: bool,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.profile == ADMIN_PROFILE
    }
}

/// User with password hash (for internal auth flows).
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

/// Insert shape handed to the credential store: password already hashed,
/// defaults already applied.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub profile: String,
    pub role: String,
    pub active: bool,
}

/// Self-service registration input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registration {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub profile: Option<String>,
    pub role: Option<String>,
}

/// Replacement values for a user's profile fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub name: String,
    pub username: String,
    pub email: String,
    pub profile: Option<String>,
    pub role: Option<String>,
}

/// Password change request for the authenticated user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}

/// Identity claims embedded in access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: user ID (standard JWT `sub` claim).
    pub sub: i64,
    pub username: String,
    pub profile: String,
    pub role: String,
    pub active: bool,
}

impl AccessClaims {
    pub fn is_admin(&self) -> bool {
        self.profile == ADMIN_PROFILE
    }
}

impl From<&User> for AccessClaims {
    fn from(user: &User) -> Self {
        Self {
            sub: user.id,
            username: user.username.clone(),
            profile: user.profile.clone(),
            role: user.role.clone(),
            active: user.active,
        }
    }
}

/// Claims embedded in refresh tokens: subject only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: i64,
}

/// Claims that passed signature, algorithm and expiry checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified<C> {
    pub claims: C,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}
