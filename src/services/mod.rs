//! Core logic, separated from HTTP handlers.
//!
//! Credential lifecycle: `secret_hasher`, `credential_issuer`,
//! `credential_validator`, `credential_revoker`.
//! Query authorization: `query_classifier`, `query_bound`, `query_gateway`.

pub mod credential_issuer;
pub mod credential_revoker;
pub mod credential_validator;
pub mod notifier;
pub mod query_bound;
pub mod query_classifier;
pub mod query_gateway;
pub mod secret_hasher;
