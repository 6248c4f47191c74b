//! # Trailbook Shared Library
//!
//! This crate contains the data layer and auth primitives shared by the
//! Trailbook API server.
//!
//! ## Module Organization
//!
//! - `models`: database models (users, tours, reviews, bookings)
//! - `store`: generic CRUD operations driven by a resource descriptor
//! - `auth`: password hashing, session tokens, reset tokens
//! - `db`: connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the Trailbook shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
