//! Marketplace Backend Library
//!
//! Authentication core (password hashing, JWT issuance, refresh-token
//! rotation, role-based access control) and its HTTP surface.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
