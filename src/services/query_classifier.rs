//! Read-only policy for caller-supplied query text.
//!
//! This is a lexical filter, not a SQL parser. A forbidden keyword anywhere in
//! the text rejects the statement, including inside string literals and
//! comments. Those false positives are accepted so the filter always fails
//! closed.

use once_cell::sync::Lazy;
use regex::Regex;

/// Mutating and DDL keywords, in the order they are reported.
pub const FORBIDDEN_KEYWORDS: [&str; 11] = [
    "INSERT", "UPDATE", "DELETE", "MERGE", "CREATE", "DROP", "ALTER", "TRUNCATE", "REPLACE",
    "GRANT", "REVOKE",
];

static FORBIDDEN_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    FORBIDDEN_KEYWORDS
        .iter()
        .map(|keyword| {
            let pattern = Regex::new(&format!(r"(?i)\b{keyword}\b"))
                .expect("keyword pattern is a valid regex");
            (*keyword, pattern)
        })
        .collect()
});

static READ_ONLY_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:(?:SELECT|WITH)\b|--)").expect("leading token pattern is a valid regex")
});

/// Why a statement was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    /// Statement does not start with SELECT, WITH or a `--` comment.
    #[error("Only SELECT queries are allowed. Queries are read-only.")]
    NotReadOnly,

    /// Statement contains a mutating or DDL keyword.
    #[error("Write operation '{0}' is not allowed. Queries are read-only.")]
    ForbiddenKeyword(&'static str),
}

/// Decide whether `text` is a permitted read-only statement.
///
/// The keyword check runs first, so a statement failing both rules reports
/// the keyword.
pub fn classify(text: &str) -> Result<(), PolicyViolation> {
    if let Some(keyword) = forbidden_keyword(text) {
        return Err(PolicyViolation::ForbiddenKeyword(keyword));
    }

    if !READ_ONLY_START.is_match(text.trim()) {
        return Err(PolicyViolation::NotReadOnly);
    }

    Ok(())
}

fn forbidden_keyword(text: &str) -> Option<&'static str> {
    FORBIDDEN_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(text))
        .map(|(keyword, _)| *keyword)
}
