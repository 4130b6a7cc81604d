//! PostgreSQL-backed stores.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{ProductStore, StoreResult, UserStore};
use crate::models::auth::{ADMIN_PROFILE, NewUser, User, UserRecord, UserUpdate};
use crate::models::product::{Product, ProductDraft};

const USER_COLUMNS: &str = "id, name, username, email, profile, role, active, password_hash";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    username: String,
    email: String,
    profile: String,
    role: String,
    active: bool,
    password_hash: String,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            user: User {
                id: row.id,
                name: row.name,
                username: row.username,
                email: row.email,
                profile: row.profile,
                role: row.role,
                active: row.active,
            },
            password_hash: row.password_hash,
        }
    }
}

/// Credential store over the `users` table.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> StoreResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {column} = $1"
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UserRecord::from))
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UserRecord::from))
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        self.find_one("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        self.find_one("email", email).await
    }

    async fn username_exists(&self, username: &str) -> StoreResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn admin_exists(&self) -> StoreResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE profile = $1)")
                .bind(ADMIN_PROFILE)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (name, username, email, password_hash, profile, role, active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.profile)
        .bind(&user.role)
        .bind(user.active)
        .fetch_one(&self.pool)
        .await?;
        Ok(User {
            id,
            name: user.name,
            username: user.username,
            email: user.email,
            profile: user.profile,
            role: user.role,
            active: user.active,
        })
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| UserRecord::from(r).user).collect())
    }

    async fn update(&self, id: i64, update: &UserUpdate) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET name = $1, username = $2, email = $3, \
             profile = COALESCE($4, profile), role = COALESCE($5, role), updated_at = now() \
             WHERE id = $6 RETURNING {USER_COLUMNS}"
        ))
        .bind(&update.name)
        .bind(&update.username)
        .bind(&update.email)
        .bind(update.profile.as_deref())
        .bind(update.role.as_deref())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| UserRecord::from(r).user))
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> StoreResult<bool> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
                .bind(password_hash)
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_active(&self, id: i64, active: bool) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET active = $1, updated_at = now() WHERE id = $2 RETURNING {USER_COLUMNS}"
        ))
        .bind(active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| UserRecord::from(r).user))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Product store over the `products` table.
#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn product_from_row((id, name, price): (i64, Option<String>, Option<f64>)) -> Product {
    Product { id, name, price }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn list(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, (i64, Option<String>, Option<f64>)>(
            "SELECT id, name, price FROM products ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(product_from_row).collect())
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, (i64, Option<String>, Option<f64>)>(
            "SELECT id, name, price FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(product_from_row))
    }

    async fn create(&self, draft: &ProductDraft) -> StoreResult<Product> {
        let row = sqlx::query_as::<_, (i64, Option<String>, Option<f64>)>(
            "INSERT INTO products (name, price) VALUES ($1, $2) RETURNING id, name, price",
        )
        .bind(draft.name.as_deref())
        .bind(draft.price)
        .fetch_one(&self.pool)
        .await?;
        Ok(product_from_row(row))
    }

    async fn update(&self, id: i64, draft: &ProductDraft) -> StoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, (i64, Option<String>, Option<f64>)>(
            "UPDATE products SET name = COALESCE($1, name), price = COALESCE($2, price) \
             WHERE id = $3 RETURNING id, name, price",
        )
        .bind(draft.name.as_deref())
        .bind(draft.price)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(product_from_row))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
