//! Credential authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the credential from `X-API-Key` or `Authorization: Bearer`
//! 2. Validate it against the credential store
//! 3. Inject authentication context into the request
//! 4. Reject unauthorized requests with HTTP 401

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use zeroize::Zeroizing;

use crate::{
    error::AppError, models::credential::CredentialInfo, services::credential_validator,
    state::AppState,
};

/// Authentication context attached to authenticated requests.
///
/// Route handlers extract it with `Extension<AuthContext>`.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub credential: CredentialInfo,
}

impl AuthContext {
    /// Fail unless the credential carries the elevated capability.
    pub fn require_elevated(&self) -> Result<(), AppError> {
        if self.credential.elevated {
            Ok(())
        } else {
            tracing::info!(
                credential_id = self.credential.id,
                "elevated capability required"
            );
            Err(AppError::AuthorizationDenied)
        }
    }

    /// Name recorded as `issued_by` for credentials this caller issues.
    pub fn principal_name(&self) -> String {
        self.credential.label.clone()
    }
}

/// Pull the presented credential out of the request headers.
///
/// `X-API-Key: <key>` takes precedence over `Authorization: Bearer <key>`.
pub fn presented_credential(headers: &HeaderMap) -> Option<&str> {
    if let Some(key) = headers.get("X-API-Key").and_then(|h| h.to_str().ok()) {
        return Some(key.trim());
    }

    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Credential authentication middleware function.
///
/// # Returns
///
/// - `Ok(Response)` if authenticated (calls next handler)
/// - `Err(AppError::AuthorizationDenied)` if the credential is missing or rejected
/// - `Err(AppError::Persistence)` if the store could not be consulted
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Owned so the request is not borrowed across the store lookup.
    let presented = presented_credential(request.headers())
        .map(|key| Zeroizing::new(key.to_owned()))
        .ok_or(AppError::AuthorizationDenied)?;

    let credential = credential_validator::validate(&state.credentials, &presented).await?;

    request
        .extensions_mut()
        .insert(AuthContext { credential });

    Ok(next.run(request).await)
}
