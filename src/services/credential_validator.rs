//! Credential validation.
//!
//! Every call hashes the presented value and asks the store; nothing is
//! cached, so a revocation is effective on the very next request.
//!
//! All rejection causes collapse into the same `AuthorizationDenied`. The
//! cause is only visible in debug logs, keyed by record id.

use std::sync::Arc;

use chrono::Utc;

use crate::error::AppError;
use crate::models::credential::CredentialInfo;
use crate::services::secret_hasher;
use crate::store::CredentialStore;

/// Validate a presented plaintext credential.
///
/// # Process
///
/// 1. Hash the plaintext
/// 2. Look up the record by hash
/// 3. Reject if missing, inactive or expired
/// 4. Record usage in the background (best effort)
///
/// # Errors
///
/// - `AuthorizationDenied`: any rejection, cause withheld
/// - `Persistence`: the lookup itself failed (fail closed)
pub async fn validate(
    store: &Arc<dyn CredentialStore>,
    plaintext: &str,
) -> Result<CredentialInfo, AppError> {
    if plaintext.is_empty() {
        return Err(AppError::AuthorizationDenied);
    }

    let secret_hash = secret_hasher::hash(plaintext);

    let Some(record) = store.find_by_hash(&secret_hash).await? else {
        tracing::debug!("credential rejected: unknown");
        return Err(AppError::AuthorizationDenied);
    };

    if !secret_hasher::hashes_match(&record.secret_hash, &secret_hash) {
        tracing::debug!(credential_id = record.id, "credential rejected: hash mismatch");
        return Err(AppError::AuthorizationDenied);
    }

    let now = Utc::now();
    if !record.is_usable_at(now) {
        tracing::debug!(
            credential_id = record.id,
            active = record.active,
            "credential rejected: inactive or expired"
        );
        return Err(AppError::AuthorizationDenied);
    }

    record_usage(Arc::clone(store), record.id);

    Ok(CredentialInfo::from(&record))
}

/// Fire-and-forget update of `last_used_at`.
///
/// Failure is logged and never reaches the caller's authorization decision.
fn record_usage(store: Arc<dyn CredentialStore>, id: i64) {
    tokio::spawn(async move {
        if let Err(e) = store.touch_last_used(id, Utc::now()).await {
            tracing::warn!(credential_id = id, "failed to record credential usage: {}", e);
        }
    });
}
