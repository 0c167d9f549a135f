//! # Taskdesk Shared Library
//!
//! Domain types, storage and business logic behind the Taskdesk API server.
//!
//! ## Module Organization
//!
//! - `models`: users and tasks, plus their request payloads
//! - `db`: store traits with PostgreSQL and in-memory providers
//! - `auth`: password hashing, session tokens, middleware and access policy
//! - `services`: registration/login and task operations

pub mod auth;
pub mod db;
pub mod models;
pub mod services;

/// Current version of the Taskdesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
