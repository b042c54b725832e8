//! # TaskCrew Shared Library
//!
//! This crate contains the data-access layer, authentication primitives,
//! and dashboard aggregation logic shared by the TaskCrew API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models (users, tasks, activities, sub-tasks)
//! - `stats`: Dashboard aggregation over the visible task set
//! - `auth`: Password hashing, JWT tokens, axum middleware
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod stats;

/// Current version of the TaskCrew shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
