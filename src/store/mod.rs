//! User persistence
//!
//! [`UserStore`] is the single source of truth for principals and their
//! refresh-token slot. [`PgUserStore`] backs the server; [`MemoryUserStore`]
//! keeps everything in process and is used by tests and local runs.

mod memory;
mod postgres;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{User, UserRole};

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

/// Identity fields that must be unique across users
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
    PhoneNumber,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UniqueField::Username => "username",
            UniqueField::Email => "email",
            UniqueField::PhoneNumber => "phone_number",
        })
    }
}

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0} already registered")]
    Conflict(UniqueField),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Fields for a user that has not been persisted yet
#[derive(Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub password_hash: String,
    pub role: UserRole,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Insert a user; duplicate identity fields yield [`StoreError::Conflict`]
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    /// Overwrite the refresh-token slot unconditionally
    async fn set_refresh_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Replace the refresh-token slot only while it still holds `expected`
    ///
    /// Returns `false` when the slot was already superseded or cleared.
    async fn rotate_refresh_token(
        &self,
        user_id: Uuid,
        expected: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Empty the refresh-token slot
    async fn clear_refresh_token(&self, user_id: Uuid) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
