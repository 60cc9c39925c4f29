//! # SoftDesk Shared Library
//!
//! This crate contains the domain types, persistence layer and the
//! project-scoped access model used by the SoftDesk API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `auth`: Authentication (passwords, JWT) and the access policy
//! - `scope`: Resolution of nested resource paths (project → issue → comment)
//! - `store`: Persistence trait with PostgreSQL and in-memory backends
//! - `db`: Connection pooling and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod scope;
pub mod store;

/// Current version of the SoftDesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
