use super::*;

// =============================================================================
// normalize_query
// =============================================================================

#[test]
fn normalize_query_rejects_empty() {
    assert_eq!(normalize_query(""), None);
}

#[test]
fn normalize_query_rejects_single_char() {
    assert_eq!(normalize_query("c"), None);
}

#[test]
fn normalize_query_rejects_whitespace_padding_below_min() {
    assert_eq!(normalize_query("  c  "), None);
}

#[test]
fn normalize_query_trims_and_accepts() {
    assert_eq!(normalize_query("  cs1  "), Some("cs1"));
}

#[test]
fn normalize_query_accepts_exactly_min_length() {
    assert_eq!(normalize_query("cs"), Some("cs"));
}

// =============================================================================
// like_pattern
// =============================================================================

#[test]
fn like_pattern_wraps_in_wildcards() {
    assert_eq!(like_pattern("cs1"), "%cs1%");
}

#[test]
fn like_pattern_escapes_percent() {
    assert_eq!(like_pattern("50%"), "%50\\%%");
}

#[test]
fn like_pattern_escapes_underscore() {
    assert_eq!(like_pattern("is_112"), "%is\\_112%");
}

#[test]
fn like_pattern_escapes_backslash_first() {
    assert_eq!(like_pattern(r"a\b"), "%a\\\\b%");
}
