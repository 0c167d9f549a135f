//! # Taskdesk API Server Library
//!
//! HTTP surface of the Taskdesk task tracker.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extractors`: Request extractors with JSON error rejections
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod routes;
