//! Free-text search helpers shared by the module and forum services.

/// Minimum query length accepted by the module directory search.
pub const MIN_QUERY_LEN: usize = 2;

/// Fixed cap applied to every free-text search result set.
pub const SEARCH_RESULT_CAP: i64 = 10;

/// Trim a search query and reject it when shorter than [`MIN_QUERY_LEN`].
#[must_use]
pub fn normalize_query(query: &str) -> Option<&str> {
    let trimmed = query.trim();
    if trimmed.chars().count() < MIN_QUERY_LEN {
        return None;
    }
    Some(trimmed)
}

/// Build a case-insensitive substring pattern for `ILIKE ... ESCAPE '\'`.
///
/// User input must not inject LIKE metacharacters, so `\`, `%` and `_` are
/// escaped before wrapping the query in wildcards.
#[must_use]
pub fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
#[path = "search_test.rs"]
mod tests;
