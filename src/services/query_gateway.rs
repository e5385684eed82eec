//! Query gateway - the only path from callers to the relational store.
//!
//! # Process
//!
//! 1. Verify the caller is a known, enabled principal
//! 2. Classify the text (read-only policy)
//! 3. Bound the row count
//! 4. Execute the single bounded statement
//! 5. Shape the outcome (trim sentinel row, flag truncation)
//!
//! A rejection at steps 1 or 2 means nothing is sent to the store.

use crate::error::AppError;
use crate::models::query::QueryOutcome;
use crate::services::{query_bound, query_classifier};
use crate::store::{RelationalStore, UserDirectory};

/// Row-count limits applied to every query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    /// Upper bound for any requested cap; also the default cap
    pub hard_cap: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self { hard_cap: 10_000 }
    }
}

/// Execute one caller-supplied read query.
///
/// # Errors
///
/// - `AuthorizationDenied`: caller unknown or disabled
/// - `PolicyViolation`: text is not a permitted read-only statement
/// - `Persistence`: directory lookup or statement execution failed; the
///   store's message is passed through unchanged
pub async fn execute(
    users: &dyn UserDirectory,
    relational: &dyn RelationalStore,
    limits: QueryLimits,
    caller: &str,
    text: &str,
    requested_cap: Option<i64>,
) -> Result<QueryOutcome, AppError> {
    match users.lookup(caller).await? {
        Some(principal) if !principal.disabled => {}
        _ => {
            tracing::info!(caller, "query rejected: unknown or disabled caller");
            return Err(AppError::AuthorizationDenied);
        }
    }

    if let Err(violation) = query_classifier::classify(text) {
        tracing::info!(caller, reason = %violation, "query rejected by policy");
        return Err(violation.into());
    }

    let bounded = query_bound::bound(text, requested_cap, limits.hard_cap);

    let rows = relational.fetch_rows(&bounded.text).await.map_err(|e| {
        tracing::warn!(caller, "query execution failed: {}", e);
        AppError::Persistence(e)
    })?;

    let (rows, truncated) = bounded.apply(rows);

    tracing::info!(
        caller,
        row_count = rows.len(),
        cap = bounded.cap,
        truncated,
        "query executed"
    );

    Ok(QueryOutcome {
        row_count: rows.len(),
        max_rows_limit: bounded.cap,
        truncated,
        rows,
    })
}
