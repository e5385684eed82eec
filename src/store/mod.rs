//! Storage collaborators.
//!
//! The services only see these traits. `postgres` holds the implementations
//! used by the server; tests substitute in-memory ones.

pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    credential::{CredentialRecord, NewCredentialRecord},
    principal::Principal,
    query::QueryRow,
};

/// Failure reported by a backing store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The store accepted a write but did not return the affected row.
    #[error("Store did not confirm the write")]
    NotConfirmed,

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Durable map from secret hash to credential metadata.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new active credential and return the stored row.
    async fn insert(&self, credential: NewCredentialRecord)
    -> Result<CredentialRecord, StoreError>;

    /// Look up the unique record for a secret hash.
    async fn find_by_hash(&self, secret_hash: &str)
    -> Result<Option<CredentialRecord>, StoreError>;

    /// List records, newest first, optionally filtered by issuer.
    async fn list(&self, issued_by: Option<&str>) -> Result<Vec<CredentialRecord>, StoreError>;

    /// Move `last_used_at` forward to `at`. Never moves it backwards.
    async fn touch_last_used(&self, id: i64, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Clear `active` and bump `updated_at`. Returns false if no such record.
    async fn deactivate(&self, id: i64) -> Result<bool, StoreError>;

    /// Permanently delete a record. Returns false if no such record.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

/// Executes caller-supplied read statements.
#[async_trait]
pub trait RelationalStore: Send + Sync {
    /// Run exactly one statement and return its rows.
    async fn fetch_rows(&self, statement: &str) -> Result<Vec<QueryRow>, StoreError>;

    /// Cheap connectivity check.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Directory of principals allowed to use the query gateway.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn lookup(&self, identity: &str) -> Result<Option<Principal>, StoreError>;
}
