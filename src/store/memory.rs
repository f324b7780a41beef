//! In-process user store

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{NewUser, StoreError, UniqueField, UserStore};
use crate::models::User;

/// User store kept in a map behind an async lock
///
/// Every mutation runs under one write guard, so the compare-and-swap in
/// [`UserStore::rotate_refresh_token`] is atomic.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;

        // Field order decides which conflict is reported
        if users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(UniqueField::Username));
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(UniqueField::Email));
        }
        if users.values().any(|u| u.phone_number == user.phone_number) {
            return Err(StoreError::Conflict(UniqueField::PhoneNumber));
        }

        let stored = User {
            id: Uuid::new_v4(),
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
            email: user.email,
            phone_number: user.phone_number,
            role: user.role,
            password_hash: user.password_hash,
            created_at: Utc::now(),
            refresh_token: None,
            refresh_token_expires_at: None,
        };
        users.insert(stored.id, stored.clone());

        Ok(stored)
    }

    async fn set_refresh_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if let Some(user) = self.users.write().await.get_mut(&user_id) {
            user.refresh_token = Some(token.to_string());
            user.refresh_token_expires_at = Some(expires_at);
        }
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        user_id: Uuid,
        expected: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;

        match users.get_mut(&user_id) {
            Some(user) if user.refresh_token.as_deref() == Some(expected) => {
                user.refresh_token = Some(token.to_string());
                user.refresh_token_expires_at = Some(expires_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear_refresh_token(&self, user_id: Uuid) -> Result<(), StoreError> {
        if let Some(user) = self.users.write().await.get_mut(&user_id) {
            user.refresh_token = None;
            user.refresh_token_expires_at = None;
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn new_user(username: &str, email: &str, phone: &str) -> NewUser {
        NewUser {
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            username: username.to_string(),
            email: email.to_string(),
            phone_number: phone.to_string(),
            password_hash: "hash".to_string(),
            role: UserRole::Buyer,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryUserStore::new();
        let user = store
            .insert(new_user("alice", "alice@example.com", "100"))
            .await
            .unwrap();

        let found = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(found.refresh_token.is_none());
        assert!(store.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unique_fields() {
        let store = MemoryUserStore::new();
        store
            .insert(new_user("alice", "alice@example.com", "100"))
            .await
            .unwrap();

        let dup_username = store.insert(new_user("alice", "a2@example.com", "101")).await;
        assert!(matches!(
            dup_username,
            Err(StoreError::Conflict(UniqueField::Username))
        ));

        let dup_email = store.insert(new_user("alice2", "alice@example.com", "102")).await;
        assert!(matches!(
            dup_email,
            Err(StoreError::Conflict(UniqueField::Email))
        ));

        let dup_phone = store.insert(new_user("alice3", "a3@example.com", "100")).await;
        assert!(matches!(
            dup_phone,
            Err(StoreError::Conflict(UniqueField::PhoneNumber))
        ));

        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_conflict_reports_username_before_email() {
        let store = MemoryUserStore::new();
        for i in 0..16 {
            store
                .insert(new_user(
                    &format!("user{}", i),
                    &format!("user{}@example.com", i),
                    &format!("{}", 100 + i),
                ))
                .await
                .unwrap();
        }

        // Email of one stored user, username of another
        for i in 0..16 {
            let clash = new_user(
                &format!("user{}", (i + 1) % 16),
                &format!("user{}@example.com", i),
                &format!("{}", 100 + i),
            );
            assert!(matches!(
                store.insert(clash).await,
                Err(StoreError::Conflict(UniqueField::Username))
            ));
        }

        let email_and_phone = new_user("fresh", "user3@example.com", "107");
        assert!(matches!(
            store.insert(email_and_phone).await,
            Err(StoreError::Conflict(UniqueField::Email))
        ));
    }

    #[tokio::test]
    async fn test_rotate_is_conditional() {
        let store = MemoryUserStore::new();
        let user = store
            .insert(new_user("alice", "alice@example.com", "100"))
            .await
            .unwrap();
        let expires = Utc::now();

        // Empty slot never matches
        assert!(!store
            .rotate_refresh_token(user.id, "r0", "r1", expires)
            .await
            .unwrap());

        store.set_refresh_token(user.id, "r1", expires).await.unwrap();
        assert!(store
            .rotate_refresh_token(user.id, "r1", "r2", expires)
            .await
            .unwrap());

        // r1 was superseded
        assert!(!store
            .rotate_refresh_token(user.id, "r1", "r3", expires)
            .await
            .unwrap());

        let found = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.refresh_token.as_deref(), Some("r2"));

        store.clear_refresh_token(user.id).await.unwrap();
        let found = store.find_by_username("alice").await.unwrap().unwrap();
        assert!(found.refresh_token.is_none());
        assert!(found.refresh_token_expires_at.is_none());
    }
}
