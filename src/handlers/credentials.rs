//! HTTP handlers for credential management.
//!
//! Every route here requires a credential with the elevated capability.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::credential::{
    CredentialResponse, IssueCredentialRequest, IssueCredentialResponse, ListCredentialsQuery,
};
use crate::services::credential_issuer::{self, IssueParams};
use crate::services::{credential_revoker, notifier};
use crate::state::AppState;

/// Issue a new credential.
///
/// # Response
///
/// Returns 201 Created. `api_key` is the plaintext and is only returned here.
///
/// ```json
/// {
///   "api_key": "kg_live_Zx8...",
///   "credential": {
///     "id": 7,
///     "display_prefix": "kg_live_Zx8q",
///     "label": "svc-A",
///     "issued_by": "bootstrap-admin",
///     "elevated": false,
///     "active": true,
///     "expires_at": "2026-11-16T10:30:00Z",
///     ...
///   },
///   "warning": "Save this credential now. It cannot be retrieved again."
/// }
/// ```
pub async fn issue_credential(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<IssueCredentialRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_elevated()?;

    let issued = credential_issuer::issue(
        state.credentials.as_ref(),
        IssueParams {
            label: request.label,
            description: request.description,
            issued_by: Some(auth.principal_name()),
            expires_in_days: request.expires_in_days,
            elevated: request.elevated,
        },
    )
    .await?;

    if let Some(address) = request.notify_address.filter(|a| !a.trim().is_empty()) {
        match &state.notifier {
            Some(sender) => notifier::notify_issued(sender.clone(), address, &issued.record),
            None => tracing::warn!(
                credential_id = issued.record.id,
                "notify_address given but no notifier is configured"
            ),
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(IssueCredentialResponse::from(issued)),
    ))
}

/// List credential metadata, newest first.
///
/// Optional `?issued_by=<name>` filter. Secrets and hashes are never returned.
pub async fn list_credentials(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListCredentialsQuery>,
) -> Result<Json<Vec<CredentialResponse>>, AppError> {
    auth.require_elevated()?;

    let records = state.credentials.list(query.issued_by.as_deref()).await?;

    Ok(Json(records.into_iter().map(Into::into).collect()))
}

/// Deactivate a credential (keeps the record for audit).
///
/// Returns 204 No Content, or 404 if the id is unknown.
pub async fn deactivate_credential(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    auth.require_elevated()?;

    if !credential_revoker::deactivate(state.credentials.as_ref(), id).await? {
        return Err(AppError::NotFound(format!("Credential {id}")));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Permanently delete a credential. This cannot be undone.
///
/// Returns 204 No Content, or 404 if the id is unknown.
pub async fn purge_credential(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    auth.require_elevated()?;

    if !credential_revoker::purge(state.credentials.as_ref(), id).await? {
        return Err(AppError::NotFound(format!("Credential {id}")));
    }

    Ok(StatusCode::NO_CONTENT)
}
