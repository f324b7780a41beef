//! JWT token generation and validation
//!
//! Handles creation and verification of access and refresh tokens. Both
//! token kinds share one claim shape and are told apart by the `type` claim.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::AuthConfig;

/// JWT-related errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token encoding failed")]
    EncodingFailed,

    /// Bad signature, wrong algorithm, malformed token or claims
    #[error("Invalid token")]
    Invalid,

    #[error("Token expired")]
    Expired,
}

/// Token type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims shared by access and refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Token type (access or refresh)
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// JWT ID, keeps tokens minted in the same second distinct
    pub jti: String,
}

/// A freshly minted access/refresh pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Signs and verifies tokens with the configured HMAC secret
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            algorithm: config.algorithm,
            access_token_ttl: config.access_token_ttl,
            refresh_token_ttl: config.refresh_token_ttl,
        }
    }

    /// Configured access token lifetime
    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    /// Configured refresh token lifetime
    pub fn refresh_token_ttl(&self) -> Duration {
        self.refresh_token_ttl
    }

    /// Issue an access token; `ttl` overrides the configured lifetime
    pub fn issue_access(
        &self,
        subject: &str,
        now: DateTime<Utc>,
        ttl: Option<Duration>,
    ) -> Result<String, TokenError> {
        let ttl = ttl.unwrap_or(self.access_token_ttl);
        self.issue(subject, TokenType::Access, now, ttl)
    }

    /// Issue a refresh token; `ttl` overrides the configured lifetime
    pub fn issue_refresh(
        &self,
        subject: &str,
        now: DateTime<Utc>,
        ttl: Option<Duration>,
    ) -> Result<String, TokenError> {
        let ttl = ttl.unwrap_or(self.refresh_token_ttl);
        self.issue(subject, TokenType::Refresh, now, ttl)
    }

    /// Issue an access and a refresh token with the configured lifetimes
    pub fn issue_pair(&self, subject: &str, now: DateTime<Utc>) -> Result<TokenPair, TokenError> {
        let access_token = self.issue_access(subject, now, None)?;
        let refresh_token = self.issue_refresh(subject, now, None)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at: expiry(now, self.access_token_ttl)?,
            refresh_expires_at: expiry(now, self.refresh_token_ttl)?,
        })
    }

    fn issue(
        &self,
        subject: &str,
        token_type: TokenType,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: subject.to_string(),
            token_type,
            iat: now.timestamp(),
            exp: expiry(now, ttl)?.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "Token encoding failed");
            TokenError::EncodingFailed
        })
    }

    /// Verify the signature and expiry of a token and return its claims
    ///
    /// The token is live while `now < exp`.
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                tracing::debug!(reason = ?e.kind(), "Token rejected");
                TokenError::Invalid
            })?;

        if now.timestamp() < token_data.claims.exp {
            Ok(token_data.claims)
        } else {
            Err(TokenError::Expired)
        }
    }
}

/// Expiry instant truncated to whole seconds
fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, TokenError> {
    now.timestamp()
        .checked_add(ttl.num_seconds())
        .and_then(|exp| DateTime::from_timestamp(exp, 0))
        .ok_or_else(|| {
            tracing::error!(ttl_seconds = ttl.num_seconds(), "Token expiry out of range");
            TokenError::EncodingFailed
        })
}
