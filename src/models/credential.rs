//! Credential models for bearer authentication.
//!
//! Credentials are stored in the database as SHA-256 hashes. The plaintext
//! only exists in memory between generation and the issuance response.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Represents a credential record from the database.
///
/// # Database Table
///
/// Maps to the `credentials` table with columns:
/// - `id`: Surrogate identifier assigned by the store
/// - `secret_hash`: SHA-256 hash of the plaintext credential
/// - `display_prefix`: First characters of the plaintext, for humans only
/// - `label`, `description`, `issued_by`: Free-text metadata
/// - `elevated`: Whether this credential may manage other credentials
/// - `active`: Cleared on revocation
/// - `expires_at`: Optional absolute expiry
/// - `last_used_at`: Moved forward on every successful validation
///
/// This type is never serialized to callers; see [`CredentialResponse`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CredentialRecord {
    pub id: i64,

    /// SHA-256 hash of the plaintext (64 hex characters)
    pub secret_hash: String,

    pub display_prefix: String,
    pub label: String,
    pub description: Option<String>,
    pub issued_by: Option<String>,
    pub elevated: bool,

    /// Inactive credentials are rejected during validation but kept for audit.
    pub active: bool,

    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// A record is usable iff it is active and has not reached its expiry.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.active && self.expires_at.is_none_or(|expires_at| now < expires_at)
    }
}

/// Values the issuer hands to the store for a new row.
///
/// The store assigns `id`, `created_at` and `updated_at`; `active` is always
/// true on insert.
#[derive(Debug, Clone)]
pub struct NewCredentialRecord {
    pub secret_hash: String,
    pub display_prefix: String,
    pub label: String,
    pub description: Option<String>,
    pub issued_by: Option<String>,
    pub elevated: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A freshly generated plaintext credential.
///
/// Zeroized on drop and redacted in `Debug`. There is deliberately no
/// `Display` or `Serialize`; reading the secret requires [`expose`].
///
/// [`expose`]: PlaintextCredential::expose
pub struct PlaintextCredential(Zeroizing<String>);

impl PlaintextCredential {
    pub(crate) fn new(secret: String) -> Self {
        Self(Zeroizing::new(secret))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PlaintextCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlaintextCredential(<redacted>)")
    }
}

/// Result of a successful issuance: the one-time plaintext plus the stored row.
#[derive(Debug)]
pub struct IssuedCredential {
    pub plaintext: PlaintextCredential,
    pub record: CredentialRecord,
}

/// Minimal identity of a validated credential.
///
/// Carries nothing that could be used to reconstruct the secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialInfo {
    pub id: i64,
    pub label: String,
    pub issued_by: Option<String>,
    pub elevated: bool,
}

impl From<&CredentialRecord> for CredentialInfo {
    fn from(record: &CredentialRecord) -> Self {
        Self {
            id: record.id,
            label: record.label.clone(),
            issued_by: record.issued_by.clone(),
            elevated: record.elevated,
        }
    }
}

/// Request body for issuing a credential.
///
/// # JSON Example
///
/// ```json
/// {
///   "label": "svc-A",
///   "description": "Reporting job",
///   "expires_in_days": 30,
///   "elevated": false,
///   "notify_address": "ops@example.com"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct IssueCredentialRequest {
    pub label: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Days until expiry; omitted means the credential never expires
    #[serde(default)]
    pub expires_in_days: Option<i64>,

    #[serde(default)]
    pub elevated: bool,

    /// Optional address that receives an issuance notice (never the secret)
    #[serde(default)]
    pub notify_address: Option<String>,
}

/// Query string for listing credentials.
#[derive(Debug, Deserialize)]
pub struct ListCredentialsQuery {
    pub issued_by: Option<String>,
}

/// Credential metadata returned to API clients.
///
/// Removes `secret_hash`; the prefix is the only trace of the plaintext.
#[derive(Debug, Serialize)]
pub struct CredentialResponse {
    pub id: i64,
    pub display_prefix: String,
    pub label: String,
    pub description: Option<String>,
    pub issued_by: Option<String>,
    pub elevated: bool,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<CredentialRecord> for CredentialResponse {
    fn from(record: CredentialRecord) -> Self {
        Self {
            id: record.id,
            display_prefix: record.display_prefix,
            label: record.label,
            description: record.description,
            issued_by: record.issued_by,
            elevated: record.elevated,
            active: record.active,
            expires_at: record.expires_at,
            last_used_at: record.last_used_at,
            created_at: record.created_at,
        }
    }
}

/// Response body for credential issuance.
///
/// The only response type in the service that carries a plaintext secret.
///
/// # JSON Example
///
/// ```json
/// {
///   "api_key": "kg_live_Zx8...",
///   "credential": { "id": 7, "display_prefix": "kg_live_Zx8q", ... },
///   "warning": "Save this credential now. It cannot be retrieved again."
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct IssueCredentialResponse {
    pub api_key: String,
    pub credential: CredentialResponse,
    pub warning: &'static str,
}

impl From<IssuedCredential> for IssueCredentialResponse {
    fn from(issued: IssuedCredential) -> Self {
        Self {
            api_key: issued.plaintext.expose().to_owned(),
            credential: issued.record.into(),
            warning: "Save this credential now. It cannot be retrieved again.",
        }
    }
}
