//! HTTP request handlers (route handlers).

/// Credential management endpoints
pub mod credentials;
/// Liveness and database connectivity
pub mod health;
/// Query gateway endpoint
pub mod query;
