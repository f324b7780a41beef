//! Authentication request/response models

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use super::UserRole;

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Registration request
#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 225))]
    pub first_name: String,
    #[validate(length(min = 1, max = 225))]
    pub last_name: String,
    #[validate(length(min = 4, max = 225))]
    pub username: String,
    #[validate(email, length(max = 225))]
    pub email: String,
    #[validate(length(min = 1, max = 30))]
    pub phone_number: String,
    #[validate(length(min = 8))]
    pub password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("phone_number", &self.phone_number)
            .field("password", &"****")
            .finish_non_exhaustive()
    }
}

/// Username/password login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

/// Refresh token request
#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Auth tokens response
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthTokensResponse {
    pub token_type: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// User response (sanitized for API)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> RegisterRequest {
        RegisterRequest {
            first_name: "Alice".to_string(),
            last_name: "Liddell".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            phone_number: "+15550100".to_string(),
            password: "pw12345678".to_string(),
        }
    }

    #[test]
    fn test_register_request_validation() {
        assert!(valid_request().validate().is_ok());

        let short_username = RegisterRequest {
            username: "bob".to_string(),
            ..valid_request()
        };
        assert!(short_username.validate().is_err());

        let short_password = RegisterRequest {
            password: "short".to_string(),
            ..valid_request()
        };
        assert!(short_password.validate().is_err());

        let bad_email = RegisterRequest {
            email: "not-an-email".to_string(),
            ..valid_request()
        };
        assert!(bad_email.validate().is_err());

        let long_phone = RegisterRequest {
            phone_number: "1".repeat(31),
            ..valid_request()
        };
        assert!(long_phone.validate().is_err());
    }

    #[test]
    fn test_request_debug_redacts_password() {
        let printed = format!("{:?}", valid_request());
        assert!(!printed.contains("pw12345678"));

        let login = LoginRequest {
            username: "alice".to_string(),
            password: "pw12345678".to_string(),
        };
        assert!(!format!("{:?}", login).contains("pw12345678"));
    }
}
