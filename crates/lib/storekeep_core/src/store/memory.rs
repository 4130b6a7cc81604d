//! In-process stores.
//!
//! Used by the test suites and by the server's `--memory-store` mode. Locks
//! are never held across an `.await`.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{EMAIL_CONSTRAINT, ProductStore, StoreError, StoreResult, USERNAME_CONSTRAINT, UserStore};
use crate::models::auth::{NewUser, User, UserRecord, UserUpdate};
use crate::models::product::{Product, ProductDraft};

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Other("memory store lock poisoned".into())
}

#[derive(Default)]
struct UserTable {
    next_id: i64,
    rows: BTreeMap<i64, UserRecord>,
}

impl UserTable {
    /// Name of the unique constraint `username`/`email` would violate,
    /// ignoring the row `except`.
    fn conflict(&self, username: &str, email: &str, except: Option<i64>) -> Option<&'static str> {
        let others = self.rows.values().filter(|r| Some(r.user.id) != except);
        for r in others {
            if r.user.username == username {
                return Some(USERNAME_CONSTRAINT);
            }
            if r.user.email == email {
                return Some(EMAIL_CONSTRAINT);
            }
        }
        None
    }
}

/// Credential store kept in a `BTreeMap` keyed by user id.
#[derive(Default)]
pub struct MemoryUserStore {
    table: RwLock<UserTable>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, pred: impl Fn(&UserRecord) -> bool) -> StoreResult<Option<UserRecord>> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table.rows.values().find(|r| pred(*r)).cloned())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<UserRecord>> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table.rows.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        self.find(|r| r.user.username == username)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        self.find(|r| r.user.email == email)
    }

    async fn username_exists(&self, username: &str) -> StoreResult<bool> {
        Ok(self.find(|r| r.user.username == username)?.is_some())
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        Ok(self.find(|r| r.user.email == email)?.is_some())
    }

    async fn admin_exists(&self) -> StoreResult<bool> {
        Ok(self.find(|r| r.user.is_admin())?.is_some())
    }

    async fn create(&self, new: NewUser) -> StoreResult<User> {
        let mut table = self.table.write().map_err(poisoned)?;
        if let Some(constraint) = table.conflict(&new.username, &new.email, None) {
            return Err(StoreError::Conflict(constraint.into()));
        }
        table.next_id += 1;
        let user = User {
            id: table.next_id,
            name: new.name,
            username: new.username,
            email: new.email,
            profile: new.profile,
            role: new.role,
            active: new.active,
        };
        table.rows.insert(
            user.id,
            UserRecord {
                user: user.clone(),
                password_hash: new.password_hash,
            },
        );
        Ok(user)
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table.rows.values().map(|r| r.user.clone()).collect())
    }

    async fn update(&self, id: i64, update: &UserUpdate) -> StoreResult<Option<User>> {
        let mut table = self.table.write().map_err(poisoned)?;
        if !table.rows.contains_key(&id) {
            return Ok(None);
        }
        if let Some(constraint) = table.conflict(&update.username, &update.email, Some(id)) {
            return Err(StoreError::Conflict(constraint.into()));
        }
        let Some(record) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        let user = &mut record.user;
        user.name.clone_from(&update.name);
        user.username.clone_from(&update.username);
        user.email.clone_from(&update.email);
        if let Some(profile) = &update.profile {
            user.profile.clone_from(profile);
        }
        if let Some(role) = &update.role {
            user.role.clone_from(role);
        }
        Ok(Some(user.clone()))
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> StoreResult<bool> {
        let mut table = self.table.write().map_err(poisoned)?;
        Ok(match table.rows.get_mut(&id) {
            Some(record) => {
                record.password_hash = password_hash.to_string();
                true
            }
            None => false,
        })
    }

    async fn set_active(&self, id: i64, active: bool) -> StoreResult<Option<User>> {
        let mut table = self.table.write().map_err(poisoned)?;
        Ok(table.rows.get_mut(&id).map(|record| {
            record.user.active = active;
            record.user.clone()
        }))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let mut table = self.table.write().map_err(poisoned)?;
        Ok(table.rows.remove(&id).is_some())
    }
}

#[derive(Default)]
struct ProductTable {
    next_id: i64,
    rows: BTreeMap<i64, Product>,
}

/// Product store kept in a `BTreeMap` keyed by product id.
#[derive(Default)]
pub struct MemoryProductStore {
    table: RwLock<ProductTable>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn list(&self) -> StoreResult<Vec<Product>> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table.rows.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Product>> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table.rows.get(&id).cloned())
    }

    async fn create(&self, draft: &ProductDraft) -> StoreResult<Product> {
        let mut table = self.table.write().map_err(poisoned)?;
        table.next_id += 1;
        let product = Product {
            id: table.next_id,
            name: draft.name.clone(),
            price: draft.price,
        };
        table.rows.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update(&self, id: i64, draft: &ProductDraft) -> StoreResult<Option<Product>> {
        let mut table = self.table.write().map_err(poisoned)?;
        Ok(table.rows.get_mut(&id).map(|product| {
            if let Some(name) = &draft.name {
                product.name = Some(name.clone());
            }
            if let Some(price) = draft.price {
                product.price = Some(price);
            }
            product.clone()
        }))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let mut table = self.table.write().map_err(poisoned)?;
        Ok(table.rows.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            name: "Test".into(),
            username: username.into(),
            email: email.into(),
            password_hash: "hash".into(),
            profile: "OPERADOR".into(),
            role: "NO-ROLE".into(),
            active: true,
        }
    }

    #[tokio::test]
    async fn create_assigns_increasing_ids() {
        let store = MemoryUserStore::new();
        let a = store.create(new_user("a", "a@x.com")).await.unwrap();
        let b = store.create(new_user("b", "b@x.com")).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert!(store.username_exists("a").await.unwrap());
        assert!(store.email_exists("b@x.com").await.unwrap());
        assert!(!store.email_exists("c@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email_with_constraint_name() {
        let store = MemoryUserStore::new();
        store.create(new_user("a", "a@x.com")).await.unwrap();
        let err = store.create(new_user("b", "a@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(c) if c == EMAIL_CONSTRAINT));
    }

    #[tokio::test]
    async fn update_may_keep_own_username() {
        let store = MemoryUserStore::new();
        let a = store.create(new_user("a", "a@x.com")).await.unwrap();
        store.create(new_user("b", "b@x.com")).await.unwrap();

        let same = UserUpdate {
            name: "Renamed".into(),
            username: "a".into(),
            email: "a@x.com".into(),
            profile: None,
            role: Some("SELLER".into()),
        };
        let updated = store.update(a.id, &same).await.unwrap().unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.role, "SELLER");
        assert_eq!(updated.profile, "OPERADOR");

        let taken = UserUpdate {
            username: "b".into(),
            ..same
        };
        let err = store.update(a.id, &taken).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(c) if c == USERNAME_CONSTRAINT));
    }

    #[tokio::test]
    async fn product_update_is_partial() {
        let store = MemoryProductStore::new();
        let created = store
            .create(&ProductDraft {
                name: Some("Pen".into()),
                price: Some(1.5),
            })
            .await
            .unwrap();

        let updated = store
            .update(
                created.id,
                &ProductDraft {
                    name: None,
                    price: Some(2.0),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name.as_deref(), Some("Pen"));
        assert_eq!(updated.price, Some(2.0));

        assert!(store.delete(created.id).await.unwrap());
        assert!(!store.delete(created.id).await.unwrap());
        assert!(store.get(created.id).await.unwrap().is_none());
    }
}
