//! Session flows: login, refresh, register.
//!
//! The service is stateless apart from the shared [`TokenCodec`] and the
//! credential store handle; clone it freely.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::jwt::{TokenCodec, TokenSettings};
use super::password::{hash_password_blocking, verify_dummy_blocking, verify_password_blocking};
use super::{AuthError, FieldErrors};
use crate::models::auth::{
    AccessClaims, ADMIN_PROFILE, DEFAULT_PROFILE, DEFAULT_ROLE, LoginOutcome, NewUser, Registration, User,
    UserRecord,
};
use crate::store::{UserStore, bounded};

/// Default deadline for a single credential store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Use `value` unless it is blank, else `fallback`.
pub(crate) fn or_default(value: Option<&str>, fallback: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}

/// Login, refresh and registration over a [`UserStore`].
#[derive(Clone)]
pub struct SessionService {
    users: Arc<dyn UserStore>,
    codec: TokenCodec,
    settings: TokenSettings,
    store_timeout: Duration,
}

impl SessionService {
    pub fn new(users: Arc<dyn UserStore>, codec: TokenCodec, settings: TokenSettings) -> Self {
        Self {
            users,
            codec,
            settings,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Override the per-call credential store deadline.
    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    pub fn settings(&self) -> TokenSettings {
        self.settings
    }

    /// Look up `identifier` as a username, then as an email.
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<UserRecord>, AuthError> {
        if let Some(record) = bounded(self.store_timeout, self.users.find_by_username(identifier)).await? {
            return Ok(Some(record));
        }
        Ok(bounded(self.store_timeout, self.users.find_by_email(identifier)).await?)
    }

    /// Authenticate with username (or email) + password and mint a token pair.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let Some(record) = self.find_by_identifier(identifier).await? else {
            verify_dummy_blocking(password.to_string()).await;
            debug!("login rejected: unknown identifier");
            return Err(AuthError::InvalidCredentials);
        };

        if !record.user.active {
            debug!(user_id = record.user.id, "login rejected: account inactive");
            return Err(AuthError::AccountInactive);
        }

        if !verify_password_blocking(password.to_string(), record.password_hash).await? {
            debug!(user_id = record.user.id, "login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let user = record.user;
        let access_token = self
            .codec
            .issue_access_token(&AccessClaims::from(&user), self.settings.access_ttl)?;
        let refresh_token = self
            .codec
            .issue_refresh_token(user.id, self.settings.refresh_ttl)?;

        info!(user_id = user.id, "user logged in");
        Ok(LoginOutcome {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Exchange a refresh token for a fresh access token built from the
    /// user's current record. The refresh token itself is not rotated.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let verified = self.codec.validate_refresh(refresh_token).map_err(|e| {
            debug!("refresh rejected: {e}");
            AuthError::InvalidToken
        })?;
        let user_id = verified.claims.sub;

        let record = bounded(self.store_timeout, self.users.find_by_id(user_id))
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if !record.user.active {
            debug!(user_id, "refresh rejected: account inactive");
            return Err(AuthError::AccountInactive);
        }

        debug!(user_id, "access token refreshed");
        self.codec
            .issue_access_token(&AccessClaims::from(&record.user), self.settings.access_ttl)
    }

    /// Validate an access token presented on a protected request.
    pub fn authenticate(&self, access_token: &str) -> Result<AccessClaims, AuthError> {
        self.codec.validate_access(access_token).map(|v| v.claims)
    }

    /// Register a new, active user.
    pub async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        let mut errors = FieldErrors::default();
        errors.require("name", &registration.name, "Name is required");
        errors.require("username", &registration.username, "Username is required");
        errors.require("email", &registration.email, "Email is required");
        errors.require("password", &registration.password, "Password is required");
        errors.into_result()?;

        let username = registration.username.trim().to_string();
        let email = registration.email.trim().to_string();

        if bounded(self.store_timeout, self.users.username_exists(&username)).await? {
            return Err(AuthError::DuplicateUsername);
        }
        if bounded(self.store_timeout, self.users.email_exists(&email)).await? {
            return Err(AuthError::DuplicateEmail);
        }

        // Only the first administrator may register themselves; later ones are
        // promoted by an existing admin.
        let profile = or_default(registration.profile.as_deref(), DEFAULT_PROFILE);
        if profile == ADMIN_PROFILE
            && bounded(self.store_timeout, self.users.admin_exists()).await?
        {
            debug!(username = %username, "registration rejected: admin profile requested");
            return Err(AuthError::Forbidden(
                "the admin profile cannot be self-assigned".into(),
            ));
        }

        let password_hash = hash_password_blocking(registration.password).await?;

        let new_user = NewUser {
            name: registration.name.trim().to_string(),
            username,
            email,
            password_hash,
            profile,
            role: or_default(registration.role.as_deref(), DEFAULT_ROLE),
            active: true,
        };
        // A concurrent registration can still win the race; the store's
        // unique constraints turn that into the same duplicate errors.
        let user = bounded(self.store_timeout, self.users.create(new_user)).await?;

        info!(user_id = user.id, username = %user.username, "user registered");
        Ok(user)
    }
}
