//! Persistence seams for users and products.
//!
//! Services depend on the [`UserStore`] and [`ProductStore`] traits only.
//! `postgres` backs them with sqlx; `memory` keeps everything in-process.

pub mod memory;
pub mod postgres;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::auth::{NewUser, User, UserRecord, UserUpdate};
use crate::models::product::{Product, ProductDraft};

pub use memory::{MemoryProductStore, MemoryUserStore};
pub use postgres::{PgProductStore, PgUserStore};

/// Unique constraint on `users.username`.
pub const USERNAME_CONSTRAINT: &str = "users_username_key";
/// Unique constraint on `users.email`.
pub const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached in time.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A unique constraint rejected the write. Carries the constraint name.
    #[error("Constraint violated: {0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Other(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(e.to_string()),
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::Conflict(db.constraint().unwrap_or_default().to_string())
            }
            _ => StoreError::Other(e.to_string()),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Run a store call under a deadline. An elapsed deadline is reported as
/// [`StoreError::Unavailable`], never as a missing row.
pub async fn bounded<T, F>(limit: Duration, call: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Unavailable(format!(
            "store call exceeded {}ms",
            limit.as_millis()
        ))),
    }
}

/// Credential store: user records and existence queries.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<UserRecord>>;

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;

    async fn username_exists(&self, username: &str) -> StoreResult<bool>;

    async fn email_exists(&self, email: &str) -> StoreResult<bool>;

    /// Whether any user holds the admin profile.
    async fn admin_exists(&self) -> StoreResult<bool>;

    /// Insert a user, returning it with its store-assigned id.
    async fn create(&self, user: NewUser) -> StoreResult<User>;

    async fn list(&self) -> StoreResult<Vec<User>>;

    /// Replace profile fields. `None` when no such user exists.
    async fn update(&self, id: i64, update: &UserUpdate) -> StoreResult<Option<User>>;

    /// Returns false when no such user exists.
    async fn update_password(&self, id: i64, password_hash: &str) -> StoreResult<bool>;

    async fn set_active(&self, id: i64, active: bool) -> StoreResult<Option<User>>;

    /// Returns false when nothing was deleted.
    async fn delete(&self, id: i64) -> StoreResult<bool>;
}

/// Product catalog store.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<Product>>;

    async fn get(&self, id: i64) -> StoreResult<Option<Product>>;

    async fn create(&self, draft: &ProductDraft) -> StoreResult<Product>;

    /// Partial update: `None` fields in `draft` keep their stored value.
    async fn update(&self, id: i64, draft: &ProductDraft) -> StoreResult<Option<Product>>;

    async fn delete(&self, id: i64) -> StoreResult<bool>;
}
