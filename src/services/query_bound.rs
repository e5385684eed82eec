//! Row-count bounding for gateway queries.
//!
//! Statements without their own limit get `LIMIT cap + 1`. The extra row is a
//! truncation sentinel: if it comes back, the result is trimmed to `cap` and
//! flagged. Statements that already limit themselves are trusted as-is. The
//! check is lexical, so `LIMIT` inside a comment or string literal also counts.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::query::QueryRow;

static EXISTING_LIMIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bLIMIT\b|\bFETCH\s+(?:FIRST|NEXT)\b")
        .expect("limit pattern is a valid regex")
});

/// A statement ready for execution plus what is needed to shape its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedQuery {
    pub text: String,
    pub cap: usize,
    pub limit_injected: bool,
}

impl BoundedQuery {
    /// Trim `rows` to the cap when the sentinel row came back.
    ///
    /// Returns the rows to hand to the caller and whether any were dropped.
    pub fn apply(&self, mut rows: Vec<QueryRow>) -> (Vec<QueryRow>, bool) {
        if self.limit_injected && rows.len() > self.cap {
            rows.truncate(self.cap);
            (rows, true)
        } else {
            (rows, false)
        }
    }
}

/// Clamp a requested row cap into `1..=hard_cap`.
///
/// Missing, non-positive and oversized requests all become `hard_cap`.
pub fn clamp_cap(requested: Option<i64>, hard_cap: usize) -> usize {
    match requested.and_then(|r| usize::try_from(r).ok()) {
        Some(cap) if (1..=hard_cap).contains(&cap) => cap,
        _ => hard_cap,
    }
}

/// Whether the statement already carries a row-limiting clause.
pub fn has_row_limit(text: &str) -> bool {
    EXISTING_LIMIT.is_match(text)
}

/// Guarantee a maximum row count for `text`.
pub fn bound(text: &str, requested: Option<i64>, hard_cap: usize) -> BoundedQuery {
    let cap = clamp_cap(requested, hard_cap);

    if has_row_limit(text) {
        return BoundedQuery {
            text: text.to_string(),
            cap,
            limit_injected: false,
        };
    }

    let statement = text.trim_end().trim_end_matches(';').trim_end();
    // New line so a trailing `--` comment cannot swallow the clause.
    let text = format!("{statement}\nLIMIT {}", cap.saturating_add(1));

    BoundedQuery {
        text,
        cap,
        limit_injected: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(n: usize) -> Vec<QueryRow> {
        (0..n)
            .map(|i| {
                let mut row = QueryRow::new();
                row.insert("n".to_string(), json!(i));
                row
            })
            .collect()
    }

    #[test]
    fn clamps_out_of_range_caps() {
        assert_eq!(clamp_cap(Some(50), 100), 50);
        assert_eq!(clamp_cap(Some(1), 100), 1);
        assert_eq!(clamp_cap(Some(100), 100), 100);
        assert_eq!(clamp_cap(Some(0), 100), 100);
        assert_eq!(clamp_cap(Some(-3), 100), 100);
        assert_eq!(clamp_cap(Some(101), 100), 100);
        assert_eq!(clamp_cap(None, 100), 100);
    }

    #[test]
    fn injects_sentinel_limit() {
        let bounded = bound("SELECT * FROM widgets", Some(10), 100);
        assert_eq!(bounded.text, "SELECT * FROM widgets\nLIMIT 11");
        assert_eq!(bounded.cap, 10);
        assert!(bounded.limit_injected);
    }

    #[test]
    fn strips_trailing_semicolons() {
        let bounded = bound("SELECT 1 ;; \n", Some(5), 100);
        assert_eq!(bounded.text, "SELECT 1\nLIMIT 6");
    }

    #[test]
    fn limit_survives_trailing_comment() {
        let bounded = bound("SELECT 1 -- first", Some(5), 100);
        assert!(bounded.text.ends_with("\nLIMIT 6"));
    }

    #[test]
    fn largest_cap_does_not_overflow() {
        let bounded = bound("SELECT 1", None, usize::MAX);
        assert_eq!(bounded.cap, usize::MAX);
        assert_eq!(bounded.text, format!("SELECT 1\nLIMIT {}", usize::MAX));
    }

    #[test]
    fn existing_limit_passes_through() {
        let text = "select * from widgets limit 3";
        let bounded = bound(text, Some(10), 100);
        assert_eq!(bounded.text, text);
        assert!(!bounded.limit_injected);

        let fetch = "SELECT * FROM widgets FETCH FIRST 5 ROWS ONLY";
        assert!(!bound(fetch, None, 100).limit_injected);
    }

    #[test]
    fn column_named_like_limit_is_not_a_clause() {
        assert!(!has_row_limit("SELECT credit_limit FROM accounts"));
        assert!(has_row_limit("SELECT * FROM t LIMIT 1"));
    }

    // Detection is lexical: the word in a comment or literal also counts, and
    // such statements run without an injected cap.
    #[test]
    fn limit_word_in_comment_or_literal_counts_as_clause() {
        assert!(has_row_limit("SELECT * FROM big -- no limit"));
        assert!(has_row_limit("SELECT * FROM notes WHERE note = 'limit'"));
        assert!(!bound("SELECT * FROM big -- no limit", None, 100).limit_injected);
    }

    #[test]
    fn apply_trims_and_flags_sentinel() {
        let bounded = bound("SELECT 1", Some(3), 100);
        let (kept, truncated) = bounded.apply(rows(4));
        assert_eq!(kept.len(), 3);
        assert!(truncated);

        let (kept, truncated) = bounded.apply(rows(3));
        assert_eq!(kept.len(), 3);
        assert!(!truncated);
    }

    #[test]
    fn apply_trusts_caller_limit() {
        let bounded = bound("SELECT 1 LIMIT 50", Some(3), 100);
        let (kept, truncated) = bounded.apply(rows(50));
        assert_eq!(kept.len(), 50);
        assert!(!truncated);
    }
}
