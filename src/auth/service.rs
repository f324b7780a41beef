//! Authentication service
//!
//! Registration, password login and refresh-token rotation. Each principal
//! owns a single refresh-token slot: every login overwrites it and every
//! successful refresh swaps it for a new token, so a superseded refresh
//! token stops working even before it expires.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::config::AuthConfig;
use crate::models::{RegisterRequest, User, UserRole};
use crate::store::{NewUser, StoreError, UniqueField, UserStore};

use super::jwt::{TokenError, TokenPair, TokenService, TokenType};
use super::password::{hash_password, verify_password, PasswordError};

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0} already registered")]
    Conflict(UniqueField),

    #[error("Invalid username or password")]
    BadCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    ExpiredToken,

    #[error("Wrong token type")]
    WrongTokenType,

    #[error("Refresh token superseded or revoked")]
    TokenRevoked,

    #[error("Insufficient role")]
    Forbidden,

    #[error("Password hashing failed")]
    Hashing,

    #[error("Token encoding failed")]
    Encoding,

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl AuthError {
    /// Credential and token failures, reported to clients as "unauthorized"
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            AuthError::BadCredentials
                | AuthError::InvalidToken
                | AuthError::ExpiredToken
                | AuthError::WrongTokenType
                | AuthError::TokenRevoked
        )
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(field) => AuthError::Conflict(field),
            other => AuthError::Store(other),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Invalid => AuthError::InvalidToken,
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::EncodingFailed => AuthError::Encoding,
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(_: PasswordError) -> Self {
        AuthError::Hashing
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    tokens: TokenService,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(store: Arc<dyn UserStore>, config: &AuthConfig) -> Self {
        Self {
            store,
            tokens: TokenService::new(config),
        }
    }

    /// Token service used for signing and verification
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Register a new buyer account
    pub async fn register(&self, req: RegisterRequest) -> Result<User, AuthError> {
        let password_hash = hash_password(&req.password)?;

        let user = self
            .store
            .insert(NewUser {
                first_name: req.first_name,
                last_name: req.last_name,
                username: req.username,
                email: req.email,
                phone_number: req.phone_number,
                password_hash,
                role: UserRole::default(),
            })
            .await
            .map_err(|e| {
                if let StoreError::Conflict(field) = &e {
                    tracing::debug!(field = %field, "Registration rejected, duplicate field");
                }
                AuthError::from(e)
            })?;

        tracing::info!(username = %user.username, "User registered");

        Ok(user)
    }

    /// Verify a username/password pair and start a new session
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AuthError> {
        let user = match self.store.find_by_username(username).await? {
            Some(user) => user,
            None => {
                // Spend the hashing cost anyway so timing does not reveal unknown users
                let _ = hash_password(password);
                tracing::debug!(username = %username, "Login failed, unknown user");
                return Err(AuthError::BadCredentials);
            }
        };

        if !verify_password(password, &user.password_hash) {
            tracing::debug!(username = %username, "Login failed, password mismatch");
            return Err(AuthError::BadCredentials);
        }

        let pair = self.tokens.issue_pair(&user.username, Utc::now())?;

        self.store
            .set_refresh_token(user.id, &pair.refresh_token, pair.refresh_expires_at)
            .await?;

        tracing::info!(username = %user.username, "Login succeeded");

        Ok(pair)
    }

    /// Exchange a live refresh token for a new pair, invalidating the old one
    pub async fn refresh(&self, presented: &str) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        let claims = self.tokens.decode(presented, now)?;

        if claims.token_type != TokenType::Refresh {
            return Err(AuthError::WrongTokenType);
        }

        let user = self
            .store
            .find_by_username(&claims.sub)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if user.refresh_token.as_deref() != Some(presented) {
            tracing::warn!(username = %user.username, "Superseded refresh token presented");
            return Err(AuthError::TokenRevoked);
        }

        match user.refresh_token_expires_at {
            Some(expires_at) if now < expires_at => {}
            _ => return Err(AuthError::ExpiredToken),
        }

        let pair = self.tokens.issue_pair(&user.username, now)?;

        let rotated = self
            .store
            .rotate_refresh_token(
                user.id,
                presented,
                &pair.refresh_token,
                pair.refresh_expires_at,
            )
            .await?;

        if !rotated {
            tracing::warn!(username = %user.username, "Concurrent refresh lost the rotation race");
            return Err(AuthError::TokenRevoked);
        }

        tracing::debug!(username = %user.username, "Refresh token rotated");

        Ok(pair)
    }

    /// Resolve an access token to the principal it was issued for
    pub async fn current_principal(&self, access_token: &str) -> Result<User, AuthError> {
        let claims = self.tokens.decode(access_token, Utc::now())?;

        if claims.token_type != TokenType::Access {
            return Err(AuthError::WrongTokenType);
        }

        if claims.sub.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        self.store
            .find_by_username(&claims.sub)
            .await?
            .ok_or(AuthError::InvalidToken)
    }

    /// Look up a principal by username
    pub async fn find_user(&self, username: &str) -> Result<Option<User>, AuthError> {
        Ok(self.store.find_by_username(username).await?)
    }

    /// End the principal's session by emptying its refresh-token slot
    pub async fn logout(&self, user: &User) -> Result<(), AuthError> {
        self.store.clear_refresh_token(user.id).await?;
        tracing::info!(username = %user.username, "Session ended");
        Ok(())
    }

    /// Check store connectivity
    pub async fn health_check(&self) -> Result<(), AuthError> {
        self.store.health_check().await.map_err(AuthError::from)
    }
}
