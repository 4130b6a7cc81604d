//! User management: listing, profile updates, deletion, password changes.
//!
//! Mutations are authorized against the caller's verified claims: a user may
//! act on their own record, administrators on any record.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::session::DEFAULT_STORE_TIMEOUT;
use crate::auth::{AuthError, FieldErrors};
use crate::models::auth::{AccessClaims, PasswordChange, User, UserRecord, UserUpdate};
use crate::store::{UserStore, bounded};

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    store_timeout: Duration,
}

fn authorize(actor: &AccessClaims, target: i64) -> Result<(), AuthError> {
    if actor.sub == target || actor.is_admin() {
        Ok(())
    } else {
        Err(AuthError::Forbidden(
            "cannot modify another user's account".into(),
        ))
    }
}

fn changed(requested: Option<&str>, current: &str) -> bool {
    requested
        .map(str::trim)
        .is_some_and(|v| !v.is_empty() && v != current)
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self {
            users,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Override the per-call store deadline.
    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    async fn record(&self, id: i64) -> Result<UserRecord, AuthError> {
        bounded(self.store_timeout, self.users.find_by_id(id))
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn list(&self) -> Result<Vec<User>, AuthError> {
        Ok(bounded(self.store_timeout, self.users.list()).await?)
    }

    pub async fn get(&self, id: i64) -> Result<User, AuthError> {
        Ok(self.record(id).await?.user)
    }

    /// Replace name, username and email; blank profile/role keep their
    /// stored values. Only administrators may change profile or role.
    pub async fn update(&self, actor: &AccessClaims, id: i64, update: UserUpdate) -> Result<User, AuthError> {
        authorize(actor, id)?;

        let mut errors = FieldErrors::default();
        errors.require("name", &update.name, "Name is required");
        errors.require("username", &update.username, "Username is required");
        errors.require("email", &update.email, "Email is required");
        errors.into_result()?;

        let current = self.record(id).await?.user;
        if !actor.is_admin()
            && (changed(update.profile.as_deref(), &current.profile)
                || changed(update.role.as_deref(), &current.role))
        {
            return Err(AuthError::Forbidden(
                "only administrators may change profile or role".into(),
            ));
        }

        let update = UserUpdate {
            name: update.name.trim().to_string(),
            username: update.username.trim().to_string(),
            email: update.email.trim().to_string(),
            profile: update.profile.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
            role: update.role.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()),
        };

        if let Some(other) = bounded(self.store_timeout, self.users.find_by_username(&update.username)).await?
            && other.user.id != id
        {
            return Err(AuthError::DuplicateUsername);
        }
        if let Some(other) = bounded(self.store_timeout, self.users.find_by_email(&update.email)).await?
            && other.user.id != id
        {
            return Err(AuthError::DuplicateEmail);
        }

        let user = bounded(self.store_timeout, self.users.update(id, &update))
            .await?
            .ok_or(AuthError::UserNotFound)?;
        info!(user_id = id, actor = actor.sub, "user updated");
        Ok(user)
    }

    pub async fn delete(&self, actor: &AccessClaims, id: i64) -> Result<(), AuthError> {
        authorize(actor, id)?;
        if !bounded(self.store_timeout, self.users.delete(id)).await? {
            return Err(AuthError::UserNotFound);
        }
        info!(user_id = id, actor = actor.sub, "user deleted");
        Ok(())
    }

    /// Change the caller's own password after re-checking the old one.
    pub async fn change_password(&self, actor: &AccessClaims, change: PasswordChange) -> Result<(), AuthError> {
        let mut errors = FieldErrors::default();
        errors.require("old_password", &change.old_password, "Current password is required");
        errors.require("new_password", &change.new_password, "New password is required");
        errors.into_result()?;

        let record = self.record(actor.sub).await?;
        if !verify_password_blocking(change.old_password, record.password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let hash = hash_password_blocking(change.new_password).await?;
        if !bounded(self.store_timeout, self.users.update_password(actor.sub, &hash)).await? {
            return Err(AuthError::UserNotFound);
        }
        info!(user_id = actor.sub, "password changed");
        Ok(())
    }

    /// Activate or deactivate an account. Administrators only.
    pub async fn set_active(&self, actor: &AccessClaims, id: i64, active: bool) -> Result<User, AuthError> {
        if !actor.is_admin() {
            return Err(AuthError::Forbidden(
                "only administrators may change account status".into(),
            ));
        }
        let user = bounded(self.store_timeout, self.users.set_active(id, active))
            .await?
            .ok_or(AuthError::UserNotFound)?;
        info!(user_id = id, active, actor = actor.sub, "account status changed");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::{hash_password, verify_password};
    use crate::models::auth::{ADMIN_PROFILE, NewUser};
    use crate::store::MemoryUserStore;

    async fn seed(store: &MemoryUserStore, username: &str, profile: &str) -> User {
        store
            .create(NewUser {
                name: username.into(),
                username: username.into(),
                email: format!("{username}@x.com"),
                password_hash: hash_password("secret123").unwrap(),
                profile: profile.into(),
                role: "NO-ROLE".into(),
                active: true,
            })
            .await
            .unwrap()
    }

    fn update_for(user: &User) -> UserUpdate {
        UserUpdate {
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            profile: None,
            role: None,
        }
    }

    #[tokio::test]
    async fn users_may_only_modify_themselves() {
        let store = Arc::new(MemoryUserStore::new());
        let alice = seed(&store, "alice", "OPERADOR").await;
        let bob = seed(&store, "bob", "OPERADOR").await;
        let svc = UserService::new(store);
        let as_alice = AccessClaims::from(&alice);

        let renamed = UserUpdate {
            name: "Alice A.".into(),
            ..update_for(&alice)
        };
        assert_eq!(svc.update(&as_alice, alice.id, renamed).await.unwrap().name, "Alice A.");

        assert!(matches!(
            svc.update(&as_alice, bob.id, update_for(&bob)).await,
            Err(AuthError::Forbidden(_))
        ));
        assert!(matches!(svc.delete(&as_alice, bob.id).await, Err(AuthError::Forbidden(_))));
    }

    #[tokio::test]
    async fn non_admins_cannot_escalate_profile() {
        let store = Arc::new(MemoryUserStore::new());
        let alice = seed(&store, "alice", "OPERADOR").await;
        let svc = UserService::new(store);

        let escalate = UserUpdate {
            profile: Some(ADMIN_PROFILE.into()),
            ..update_for(&alice)
        };
        assert!(matches!(
            svc.update(&AccessClaims::from(&alice), alice.id, escalate).await,
            Err(AuthError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn admins_manage_everyone() {
        let store = Arc::new(MemoryUserStore::new());
        let admin = seed(&store, "root", ADMIN_PROFILE).await;
        let bob = seed(&store, "bob", "OPERADOR").await;
        let svc = UserService::new(store);
        let as_admin = AccessClaims::from(&admin);

        let promote = UserUpdate {
            role: Some("SELLER".into()),
            ..update_for(&bob)
        };
        assert_eq!(svc.update(&as_admin, bob.id, promote).await.unwrap().role, "SELLER");

        let off = svc.set_active(&as_admin, bob.id, false).await.unwrap();
        assert!(!off.active);

        svc.delete(&as_admin, bob.id).await.unwrap();
        assert!(matches!(svc.get(bob.id).await, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn update_rejects_taken_username() {
        let store = Arc::new(MemoryUserStore::new());
        let alice = seed(&store, "alice", "OPERADOR").await;
        seed(&store, "bob", "OPERADOR").await;
        let svc = UserService::new(store);

        let clash = UserUpdate {
            username: "bob".into(),
            ..update_for(&alice)
        };
        assert!(matches!(
            svc.update(&AccessClaims::from(&alice), alice.id, clash).await,
            Err(AuthError::DuplicateUsername)
        ));
    }

    #[tokio::test]
    async fn change_password_requires_old_password() {
        let store = Arc::new(MemoryUserStore::new());
        let alice = seed(&store, "alice", "OPERADOR").await;
        let svc = UserService::new(store.clone());
        let as_alice = AccessClaims::from(&alice);

        let wrong = PasswordChange {
            old_password: "nope".into(),
            new_password: "newsecret".into(),
        };
        assert!(matches!(
            svc.change_password(&as_alice, wrong).await,
            Err(AuthError::InvalidCredentials)
        ));

        let right = PasswordChange {
            old_password: "secret123".into(),
            new_password: "newsecret".into(),
        };
        svc.change_password(&as_alice, right).await.unwrap();

        let record = store.find_by_id(alice.id).await.unwrap().unwrap();
        assert!(verify_password("newsecret", &record.password_hash).unwrap());
    }

    #[tokio::test]
    async fn only_admins_toggle_accounts() {
        let store = Arc::new(MemoryUserStore::new());
        let alice = seed(&store, "alice", "OPERADOR").await;
        let svc = UserService::new(store);
        assert!(matches!(
            svc.set_active(&AccessClaims::from(&alice), alice.id, false).await,
            Err(AuthError::Forbidden(_))
        ));
    }
}
