//! PostgreSQL-backed user store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{NewUser, StoreError, UniqueField, UserStore};
use crate::models::User;

/// User store on top of a sqlx connection pool
#[derive(Clone)]
pub struct PgUserStore {
    db_pool: PgPool,
}

impl PgUserStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

/// Map a unique-constraint violation onto the offending identity field
fn conflict_field(err: &sqlx::Error) -> Option<UniqueField> {
    let db_err = err.as_database_error()?;
    if !db_err.is_unique_violation() {
        return None;
    }

    let constraint = db_err.constraint().unwrap_or_default();
    if constraint.contains("email") {
        Some(UniqueField::Email)
    } else if constraint.contains("phone") {
        Some(UniqueField::PhoneNumber)
    } else {
        Some(UniqueField::Username)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user: Option<User> = sqlx::query_as(
            r#"
            SELECT id, first_name, last_name, username, email, phone_number, role,
                   password_hash, created_at, refresh_token, refresh_token_expires_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        sqlx::query_as(
            r#"
            INSERT INTO users (id, first_name, last_name, username, email, phone_number, role, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, first_name, last_name, username, email, phone_number, role,
                      password_hash, created_at, refresh_token, refresh_token_expires_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(user.role)
        .bind(&user.password_hash)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| match conflict_field(&e) {
            Some(field) => StoreError::Conflict(field),
            None => StoreError::from(e),
        })
    }

    async fn set_refresh_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
            SET refresh_token = $1, refresh_token_expires_at = $2
            WHERE id = $3
            "#,
        )
        .bind(token)
        .bind(expires_at)
        .bind(user_id)
        .execute(&self.db_pool)
        .await?;

        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        user_id: Uuid,
        expected: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        // Dropping the transaction on an early return rolls it back
        let mut tx = self.db_pool.begin().await?;

        let current: Option<Option<String>> = sqlx::query_scalar(
            r#"
            SELECT refresh_token FROM users WHERE id = $1 FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if current.flatten().as_deref() != Some(expected) {
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE users
            SET refresh_token = $1, refresh_token_expires_at = $2
            WHERE id = $3
            "#,
        )
        .bind(token)
        .bind(expires_at)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(true)
    }

    async fn clear_refresh_token(&self, user_id: Uuid) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
            SET refresh_token = NULL, refresh_token_expires_at = NULL
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.db_pool)
        .await?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        crate::db::check_health(&self.db_pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}
