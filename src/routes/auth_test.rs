use super::*;

// =============================================================================
// normalize_email
// =============================================================================

#[test]
fn normalize_email_lowercases_and_trims() {
    assert_eq!(
        normalize_email("  Alice.Tan@Campus.EDU  "),
        Some("alice.tan@campus.edu".into())
    );
}

#[test]
fn normalize_email_rejects_missing_at() {
    assert_eq!(normalize_email("alice.campus.edu"), None);
}

#[test]
fn normalize_email_rejects_multiple_ats() {
    assert_eq!(normalize_email("alice@tan@campus.edu"), None);
}

#[test]
fn normalize_email_rejects_empty_local_or_domain() {
    assert_eq!(normalize_email("@campus.edu"), None);
    assert_eq!(normalize_email("alice@"), None);
    assert_eq!(normalize_email(""), None);
}

// =============================================================================
// name_from_email
// =============================================================================

#[test]
fn name_from_email_takes_local_part() {
    assert_eq!(name_from_email("alice.tan@campus.edu"), "alice.tan");
}

#[test]
fn name_from_email_falls_back_for_degenerate_input() {
    assert_eq!(name_from_email("@campus.edu"), "student");
    assert_eq!(name_from_email(""), "student");
}

// =============================================================================
// env_bool
// =============================================================================

#[test]
fn env_bool_parses_common_spellings() {
    // Unique key per test to avoid cross-test env races.
    let key = "AUTH_TEST_ENV_BOOL_SPELLINGS";
    for (raw, expected) in [
        ("1", Some(true)),
        ("true", Some(true)),
        ("YES", Some(true)),
        (" on ", Some(true)),
        ("0", Some(false)),
        ("False", Some(false)),
        ("off", Some(false)),
        ("maybe", None),
        ("", None),
    ] {
        unsafe { std::env::set_var(key, raw) };
        assert_eq!(env_bool(key), expected, "raw = {raw:?}");
    }
    unsafe { std::env::remove_var(key) };
}

#[test]
fn env_bool_unset_is_none() {
    assert_eq!(env_bool("AUTH_TEST_ENV_BOOL_UNSET"), None);
}

// =============================================================================
// session cookie shape
// =============================================================================

#[test]
fn session_cookie_is_http_only_lax_and_rooted() {
    let cookie = session_cookie("abc123".into());
    assert_eq!(cookie.name(), "session_token");
    assert_eq!(cookie.value(), "abc123");
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
}
