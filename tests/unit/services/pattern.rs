use super::*;

const SAMPLE: &str = "The cat sat on the CAT mat.";

fn matched<'a>(pattern: &SearchPattern, text: &'a str) -> Vec<&'a str> {
    pattern
        .find_all(text)
        .into_iter()
        .map(|r| &text[r])
        .collect()
}

#[test]
fn literal_is_case_insensitive_by_default() {
    let pattern = compile("cat", SearchMode::Literal, false).unwrap();
    assert_eq!(matched(&pattern, SAMPLE), vec!["cat", "CAT"]);
}

#[test]
fn literal_case_sensitive_is_opt_in() {
    let pattern = compile("cat", SearchMode::Literal, true).unwrap();
    assert_eq!(matched(&pattern, SAMPLE), vec!["cat"]);
}

#[test]
fn regex_wildcard_matches_both_cases() {
    let pattern = compile("ca.", SearchMode::Regex, false).unwrap();
    assert_eq!(matched(&pattern, SAMPLE), vec!["cat", "CAT"]);
}

#[test]
fn literal_escapes_metacharacters() {
    let pattern = compile("a.b (c)*", SearchMode::Literal, false).unwrap();
    assert_eq!(matched(&pattern, "xa.b (c)*y axb c"), vec!["a.b (c)*"]);

    let pattern = compile("ca.", SearchMode::Literal, false).unwrap();
    assert!(matched(&pattern, SAMPLE).is_empty());
}

#[test]
fn literal_normalizes_query_whitespace() {
    let pattern = compile("  the \t\n cat ", SearchMode::Literal, false).unwrap();
    assert_eq!(pattern.key().query(), "the cat");
    assert_eq!(matched(&pattern, SAMPLE), vec!["The cat"]);
}

#[test]
fn regex_keeps_query_whitespace() {
    let key = PatternKey::new(" a  b ", SearchMode::Regex, false);
    assert_eq!(key.query(), " a  b ");
}

#[test]
fn invalid_regex_is_reported() {
    let err = compile("(", SearchMode::Regex, false).unwrap_err();
    assert!(err.to_string().starts_with("invalid regex pattern"));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn invalid_regex_text_is_fine_as_literal() {
    let pattern = compile("(", SearchMode::Literal, false).unwrap();
    assert_eq!(matched(&pattern, "f(x)"), vec!["("]);
}

#[test]
fn empty_queries_yield_no_matches() {
    let literal = compile("   ", SearchMode::Literal, false).unwrap();
    assert!(literal.find_all(SAMPLE).is_empty());
    assert!(!literal.is_match(SAMPLE));

    let regex = compile("", SearchMode::Regex, false).unwrap();
    assert!(regex.find_all(SAMPLE).is_empty());
}

#[test]
fn nullable_regex_reports_only_non_empty_matches() {
    let pattern = compile("a*", SearchMode::Regex, true).unwrap();
    assert_eq!(matched(&pattern, "baaac a"), vec!["aaa", "a"]);
}

#[test]
fn matches_do_not_overlap() {
    let pattern = compile("aa", SearchMode::Literal, false).unwrap();
    assert_eq!(pattern.find_all("aaaaa"), vec![0..2, 2..4]);
}

#[test]
fn size_limit_rejects_pathological_patterns() {
    let err = compile_with_limit(r"(\w{1000}){1000}", SearchMode::Regex, false, 1 << 10);
    assert!(matches!(err, Err(PatternError::Invalid { .. })));
}

#[test]
fn key_display_is_stable() {
    let key = PatternKey::new("cat", SearchMode::Regex, true);
    assert_eq!(key.to_string(), "cat_true_true");
    assert_ne!(key, PatternKey::new("cat", SearchMode::Literal, true));
}

#[test]
fn normalize_whitespace_collapses_and_trims() {
    assert_eq!(normalize_whitespace("  a \u{a0}\t b\n"), "a b");
    assert_eq!(normalize_whitespace(" \n "), "");
}

#[test]
fn normalized_offsets_map_back_to_source() {
    let source = "  The   big\tcat ";
    let normalized = normalize_with_offsets(source);
    assert_eq!(normalized.as_str(), "The big cat");

    let pattern = compile("big cat", SearchMode::Literal, false).unwrap();
    let hit = pattern.find_all(normalized.as_str())[0].clone();
    let range = normalized.to_source_range(hit).unwrap();
    assert_eq!(&source[range], "big\tcat");
    assert_eq!(normalized.to_source_range(3..3), None);
}
