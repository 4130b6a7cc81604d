//! Authentication and authorization logic.
//!
//! Provides password hashing, signed token issuance/validation, and the
//! session flows (login, refresh, register) built on top of a [`UserStore`].
//!
//! [`UserStore`]: crate::store::UserStore

pub mod jwt;
pub mod password;
pub mod session;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::store::{EMAIL_CONSTRAINT, StoreError, USERNAME_CONSTRAINT};

/// Per-field validation messages, keyed by request field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(pub BTreeMap<String, String>);

impl FieldErrors {
    /// Record `message` for `field` when `value` is blank.
    pub fn require(&mut self, field: &str, value: &str, message: &str) {
        if value.trim().is_empty() {
            self.0.insert(field.to_string(), message.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(())` when no field failed, otherwise [`AuthError::Validation`].
    pub fn into_result(self) -> Result<(), AuthError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AuthError::Validation(self))
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown identifier or wrong password. Deliberately indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is inactive")]
    AccountInactive,

    #[error("User not found")]
    UserNotFound,

    #[error("Username already registered")]
    DuplicateUsername,

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    ExpiredToken,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Validation error: {0}")]
    Validation(FieldErrors),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Hashing error: {0}")]
    Hashing(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => AuthError::StoreUnavailable(msg),
            StoreError::Conflict(c) if c == USERNAME_CONSTRAINT => AuthError::DuplicateUsername,
            StoreError::Conflict(c) if c == EMAIL_CONSTRAINT => AuthError::DuplicateEmail,
            StoreError::Conflict(c) => AuthError::Internal(format!("constraint violated: {c}")),
            StoreError::Other(msg) => AuthError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_flags_blank_values_only() {
        let mut errors = FieldErrors::default();
        errors.require("name", "  ", "Name is required");
        errors.require("email", "a@x.com", "Email is required");
        assert_eq!(errors.0.len(), 1);
        assert_eq!(errors.0["name"], "Name is required");
        assert!(matches!(errors.into_result(), Err(AuthError::Validation(_))));
    }

    #[test]
    fn store_conflicts_map_to_duplicate_errors() {
        let e = AuthError::from(StoreError::Conflict(USERNAME_CONSTRAINT.into()));
        assert!(matches!(e, AuthError::DuplicateUsername));
        let e = AuthError::from(StoreError::Conflict(EMAIL_CONSTRAINT.into()));
        assert!(matches!(e, AuthError::DuplicateEmail));
        let e = AuthError::from(StoreError::Unavailable("down".into()));
        assert!(matches!(e, AuthError::StoreUnavailable(_)));
    }
}
