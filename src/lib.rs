//! keygate - credential lifecycle and read-only query gateway.
//!
//! Issues, validates and revokes opaque bearer credentials, and mediates
//! caller-supplied SQL through a read-only, row-bounded gateway.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: Bearer credentials stored as SHA-256 hashes
//! - **Query policy**: Lexical read-only filter plus injected row limit

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod store;
