//! Authentication module for the marketplace
//!
//! - Argon2 password hashing
//! - JWT access/refresh token generation and validation
//! - Single-slot refresh-token rotation
//! - Role-based access policies

mod gate;
mod jwt;
mod password;
mod service;

pub use gate::{authorize, require_owner_or_admin, RolePolicy};
pub use jwt::{Claims, TokenError, TokenPair, TokenService, TokenType};
pub use password::{hash_password, verify_password, PasswordError};
pub use service::{AuthError, AuthService};
