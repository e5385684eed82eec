//! Shared application state.
//!
//! Built once in `main` and cloned into every handler by Axum. Clones share
//! the same collaborators.

use std::sync::Arc;

use crate::services::notifier::NotificationSender;
use crate::services::query_gateway::QueryLimits;
use crate::store::{CredentialStore, RelationalStore, UserDirectory};

#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<dyn CredentialStore>,
    pub relational: Arc<dyn RelationalStore>,
    pub users: Arc<dyn UserDirectory>,
    pub notifier: Option<Arc<dyn NotificationSender>>,
    pub limits: QueryLimits,

    /// Started without a reachable database; reported by `/health`.
    pub degraded: bool,
}
