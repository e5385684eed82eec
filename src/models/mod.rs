//! Data models and API request/response types.

/// Bearer credential records and the one-time plaintext
pub mod credential;
/// Query gateway caller principal
pub mod principal;
/// Query gateway request/outcome
pub mod query;
