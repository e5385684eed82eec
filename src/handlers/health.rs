//! Health check endpoint for service monitoring.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{error::AppError, state::AppState};

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy`, or `degraded` when the service runs without its database
    pub status: String,

    /// `connected` or `unreachable`
    pub database: String,

    pub degraded: bool,

    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    fn new(status: &str, database: &str) -> Self {
        Self {
            status: status.to_string(),
            database: database.to_string(),
            degraded: status == "degraded",
            timestamp: Utc::now(),
        }
    }
}

/// Health check handler.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "status": "healthy",
///   "database": "connected",
///   "degraded": false,
///   "timestamp": "2025-12-21T19:00:00Z"
/// }
/// ```
///
/// A service started in degraded mode answers 200 with `"status": "degraded"`
/// and `"database": "unreachable"` while the ping fails, and reports healthy
/// again once the database answers.
///
/// # Response (503 Service Unavailable)
///
/// Outside degraded mode an unreachable database returns the standard error
/// response.
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    match state.relational.ping().await {
        Ok(()) => Ok(Json(HealthResponse::new("healthy", "connected"))),
        Err(err) if state.degraded => {
            tracing::debug!(error = %err, "health ping failed in degraded mode");
            Ok(Json(HealthResponse::new("degraded", "unreachable")))
        }
        Err(err) => Err(err.into()),
    }
}
