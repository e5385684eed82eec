//! HTTP handler for the query gateway.

use axum::{Json, extract::State};

use crate::error::AppError;
use crate::models::query::{QueryRequest, QueryResponse};
use crate::services::query_gateway;
use crate::state::AppState;

/// Execute a read-only query.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "success": true,
///   "row_count": 2,
///   "max_rows_limit": 10000,
///   "truncated": false,
///   "truncation_warning": null,
///   "rows": [{"status": "active", "count": 12}, {"status": "churned", "count": 3}]
/// }
/// ```
///
/// Rejections use the standard error body with `success: false`.
pub async fn execute_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    let outcome = query_gateway::execute(
        state.users.as_ref(),
        state.relational.as_ref(),
        state.limits,
        &request.identity,
        &request.query,
        request.max_rows,
    )
    .await?;

    Ok(Json(outcome.into()))
}
