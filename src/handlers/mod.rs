//! API handlers for the marketplace backend

pub mod auth;

pub use auth::*;
