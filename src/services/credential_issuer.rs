//! Credential issuance.
//!
//! # Process
//!
//! 1. Validate the request (before any store interaction)
//! 2. Generate `kg_live_` + URL-safe base64 of 32 random bytes
//! 3. Derive the hash and display prefix
//! 4. Insert the record; the store must return the row
//! 5. Return the plaintext together with the stored metadata

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};

use crate::error::AppError;
use crate::models::credential::{IssuedCredential, NewCredentialRecord, PlaintextCredential};
use crate::services::secret_hasher;
use crate::store::CredentialStore;

/// Marker every issued credential starts with.
pub const CREDENTIAL_PREFIX: &str = "kg_live_";

/// Longest accepted expiry, in days.
pub const MAX_EXPIRY_DAYS: i64 = 36_500;

/// Longest accepted label or `issued_by`, matching the column widths.
pub const MAX_LABEL_LEN: usize = 255;

/// Everything needed to issue one credential.
#[derive(Debug, Clone, Default)]
pub struct IssueParams {
    pub label: String,
    pub description: Option<String>,
    pub issued_by: Option<String>,
    pub expires_in_days: Option<i64>,
    pub elevated: bool,
}

/// Issue a new credential.
///
/// # Returns
///
/// The plaintext (the only time it is ever available) and the stored record.
///
/// # Errors
///
/// - `Validation`: blank or overlong label, overlong `issued_by`, expiry
///   outside `1..=36500` days
/// - `Persistence`: the store failed or did not confirm the insert; the
///   generated plaintext is discarded
pub async fn issue(
    store: &dyn CredentialStore,
    params: IssueParams,
) -> Result<IssuedCredential, AppError> {
    let label = params.label.trim();
    if label.is_empty() {
        return Err(AppError::Validation("Label must not be empty".to_string()));
    }
    if label.chars().count() > MAX_LABEL_LEN {
        return Err(AppError::Validation(format!(
            "Label must be at most {MAX_LABEL_LEN} characters"
        )));
    }

    let issued_by = params.issued_by.filter(|i| !i.trim().is_empty());
    if issued_by
        .as_deref()
        .is_some_and(|i| i.chars().count() > MAX_LABEL_LEN)
    {
        return Err(AppError::Validation(format!(
            "issued_by must be at most {MAX_LABEL_LEN} characters"
        )));
    }

    let expires_at = match params.expires_in_days {
        None => None,
        Some(days) if (1..=MAX_EXPIRY_DAYS).contains(&days) => {
            Some(Utc::now() + Duration::days(days))
        }
        Some(_) => {
            return Err(AppError::Validation(format!(
                "expires_in_days must be between 1 and {MAX_EXPIRY_DAYS}"
            )));
        }
    };

    let plaintext = generate_plaintext();

    let new_record = NewCredentialRecord {
        secret_hash: secret_hasher::hash(plaintext.expose()),
        display_prefix: secret_hasher::display_prefix(plaintext.expose()),
        label: label.to_string(),
        description: params.description.filter(|d| !d.trim().is_empty()),
        issued_by,
        elevated: params.elevated,
        expires_at,
    };

    let record = store.insert(new_record).await?;

    tracing::info!(
        credential_id = record.id,
        display_prefix = %record.display_prefix,
        label = %record.label,
        issued_by = record.issued_by.as_deref().unwrap_or("-"),
        elevated = record.elevated,
        "credential issued"
    );

    Ok(IssuedCredential { plaintext, record })
}

/// Generate a fresh plaintext credential from the thread-local CSPRNG.
fn generate_plaintext() -> PlaintextCredential {
    let bytes: [u8; 32] = rand::random();
    PlaintextCredential::new(format!("{CREDENTIAL_PREFIX}{}", URL_SAFE_NO_PAD.encode(bytes)))
}
