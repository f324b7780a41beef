//! Middleware for the marketplace API
//!
//! Request logging and the authentication extractors.

pub mod auth;
mod logging;

pub use auth::{AdminUser, AuthenticatedUser, SellerUser};
pub use logging::request_tracing;
