//! Query gateway request/response types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One result row, keyed by column name.
pub type QueryRow = Map<String, Value>;

/// Request body for `POST /api/v1/query`.
///
/// # JSON Example
///
/// ```json
/// {
///   "identity": "alice",
///   "query": "SELECT status, COUNT(*) FROM customers GROUP BY status",
///   "max_rows": 500
/// }
/// ```
///
/// `max_rows` may be omitted; out-of-range values are clamped to the
/// configured hard cap.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub identity: String,
    pub query: String,

    #[serde(default)]
    pub max_rows: Option<i64>,
}

/// Shaped result of one gateway invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub rows: Vec<QueryRow>,
    pub row_count: usize,

    /// Cap applied to this query after clamping
    pub max_rows_limit: usize,

    /// More rows existed than `max_rows_limit`; only the first ones are returned
    pub truncated: bool,
}

/// JSON body returned for a successful query.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub success: bool,
    pub row_count: usize,
    pub max_rows_limit: usize,
    pub truncated: bool,
    pub truncation_warning: Option<String>,
    pub rows: Vec<QueryRow>,
}

impl From<QueryOutcome> for QueryResponse {
    fn from(outcome: QueryOutcome) -> Self {
        let truncation_warning = outcome.truncated.then(|| {
            format!(
                "Results limited to {} rows. Use aggregations (COUNT, SUM, etc.) for large datasets.",
                outcome.max_rows_limit
            )
        });

        Self {
            success: true,
            row_count: outcome.row_count,
            max_rows_limit: outcome.max_rows_limit,
            truncated: outcome.truncated,
            truncation_warning,
            rows: outcome.rows,
        }
    }
}
