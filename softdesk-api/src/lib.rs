//! # SoftDesk API Server Library
//!
//! HTTP surface of the SoftDesk issue tracker: projects, their members,
//! issues and comments, all behind JWT authentication.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Body and path extractors rejecting with `ApiError`
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
