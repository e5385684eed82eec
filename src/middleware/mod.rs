//! HTTP middleware components.

/// Credential authentication middleware
pub mod auth;
