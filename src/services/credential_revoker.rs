//! Credential revocation.
//!
//! `deactivate` is the normal path: the record stays for audit and fails
//! validation from the next request on. `purge` deletes the record and
//! cannot be undone.

use crate::error::AppError;
use crate::store::CredentialStore;

/// Deactivate a credential. Returns false if no such record exists.
pub async fn deactivate(store: &dyn CredentialStore, id: i64) -> Result<bool, AppError> {
    check_id(id)?;

    let found = store.deactivate(id).await?;
    if found {
        tracing::info!(credential_id = id, "credential deactivated");
    }

    Ok(found)
}

/// Permanently delete a credential. Irreversible.
///
/// Returns false if no such record exists.
pub async fn purge(store: &dyn CredentialStore, id: i64) -> Result<bool, AppError> {
    check_id(id)?;

    let found = store.delete(id).await?;
    if found {
        tracing::warn!(credential_id = id, "credential permanently deleted");
    }

    Ok(found)
}

fn check_id(id: i64) -> Result<(), AppError> {
    if id < 1 {
        return Err(AppError::Validation(format!("Invalid credential id {id}")));
    }
    Ok(())
}
