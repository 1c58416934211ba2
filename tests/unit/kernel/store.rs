use super::*;
use crate::kernel::{MarkSummary, ScrollBlock, SearchPhase};
use crate::models::parse_html;

const PAGE: &str = "<html><body><p>The cat sat on the CAT mat.</p><script>var cat;</script></body></html>";

fn new_store() -> Store {
    let tree = parse_html(PAGE).unwrap();
    Store::new(tree, HighlightSettings::default())
}

#[test]
fn ping_acks() {
    let mut store = new_store();
    let result = store.dispatch_json(r#"{"action":"ping"}"#);
    assert_eq!(result.response, Response::ack());
    assert!(result.effects.is_empty());
}

#[test]
fn search_reports_count_and_lists_marks() {
    let mut store = new_store();
    let result = store.dispatch_json(r##"{"action":"highlight","text":"cat","color":"#abcdef"}"##);
    assert_eq!(result.response, Response::count(2));
    assert_eq!(result.effects.len(), 1);

    let result = store.dispatch_json(r#"{"action":"get-highlights"}"#);
    assert_eq!(
        result.response,
        Response::Marks {
            marks: vec![MarkSummary {
                id: 1,
                text: "cat".to_string(),
                color: "#abcdef".to_string(),
                count: 2,
            }]
        }
    );
}

#[test]
fn missing_color_uses_default() {
    let mut store = new_store();
    store.dispatch_json(r#"{"action":"search","text":"cat","caseSensitive":true}"#);
    let entry = &store.manager().entries()[0];
    assert_eq!(entry.color, "#ffeb3b");
    assert_eq!(entry.count, 1);
}

#[test]
fn regex_search_and_invalid_pattern() {
    let mut store = new_store();
    let result = store.dispatch_json(r#"{"action":"search","text":"ca.","patternMode":true}"#);
    assert_eq!(result.response, Response::count(2));

    let result = store.dispatch_json(r#"{"action":"search","text":"(","isRegex":true}"#);
    assert!(!result.response.is_ok());
    match result.response {
        Response::Failure { error, .. } => assert!(error.starts_with("invalid regex pattern")),
        other => panic!("unexpected response: {other:?}"),
    }
    assert!(store.manager().marks().is_empty());
}

#[test]
fn navigate_emits_centered_scroll() {
    let mut store = new_store();
    store.dispatch_json(r#"{"action":"search","text":"cat"}"#);

    let result = store.dispatch_json(r#"{"action":"navigate","index":-1}"#);
    assert_eq!(result.response, Response::ack());
    let expected = store.manager().marks()[1].node;
    assert_eq!(
        result.effects,
        vec![Effect::ScrollIntoView {
            node: expected,
            block: ScrollBlock::Center
        }]
    );

    store.dispatch_json(r#"{"action":"step","delta":1}"#);
    assert_eq!(store.manager().cursor(), 0);
}

#[test]
fn clear_restores_document() {
    let mut store = new_store();
    let original = store.tree().inner_markup(store.tree().root());

    // nothing active yet
    let result = store.dispatch_json(r#"{"action":"clear"}"#);
    assert_eq!(result.response, Response::ack());

    store.dispatch_json(r#"{"action":"search","text":"cat"}"#);
    let result = store.dispatch_json(r#"{"action":"remove-highlight"}"#);
    assert_eq!(result.response, Response::ack());
    assert_eq!(store.manager().phase(), SearchPhase::Idle);
    let tree = store.into_tree();
    assert_eq!(tree.inner_markup(tree.root()), original);
}

#[test]
fn clear_by_id() {
    let mut store = new_store();
    store.dispatch_json(r#"{"action":"search","text":"mat"}"#);

    let result = store.dispatch_json(r#"{"action":"clear","id":1}"#);
    assert_eq!(result.response, Response::ack());
    assert!(store.manager().entries().is_empty());
    assert_eq!(store.manager().phase(), SearchPhase::Idle);
}

#[test]
fn remove_with_foreign_id_clears_everything() {
    let tree = parse_html("<body><p>cat</p></body>").unwrap();
    let mut store = Store::new(tree, HighlightSettings::default());
    store.dispatch_json(r#"{"action":"search","text":"cat"}"#);
    assert!(store
        .tree()
        .inner_markup(store.tree().root())
        .contains("page-highlighter-highlight"));

    // 面板以时间戳作为 id
    let result = store.dispatch_json(r#"{"action":"remove-highlight","id":1760000000000}"#);
    assert_eq!(result.response, Response::ack());
    assert_eq!(store.manager().phase(), SearchPhase::Idle);
    assert!(store.manager().entries().is_empty());
    assert_eq!(
        store.tree().inner_markup(store.tree().root()),
        "<body><p>cat</p></body>"
    );
}

#[test]
fn queries_match_decoded_text() {
    let source = "<body><p>Tom &amp; Jerry</p></body>";
    let mut store = Store::new(parse_html(source).unwrap(), HighlightSettings::default());

    let result = store.dispatch_json(r#"{"action":"search","text":"amp"}"#);
    assert_eq!(result.response, Response::count(0));
    assert_eq!(store.tree().inner_markup(store.tree().root()), source);

    let result = store.dispatch_json(r#"{"action":"search","text":"Tom & Jerry"}"#);
    assert_eq!(result.response, Response::count(1));
    assert_eq!(store.manager().marks()[0].text, "Tom & Jerry");
    assert!(store
        .tree()
        .inner_markup(store.tree().root())
        .contains(">Tom &amp; Jerry</span>"));

    store.dispatch_json(r#"{"action":"clear"}"#);
    assert_eq!(store.tree().inner_markup(store.tree().root()), source);
}

#[test]
fn rejects_unknown_and_malformed_requests() {
    let mut store = new_store();

    let result = store.dispatch_json(r#"{"action":"explode"}"#);
    assert_eq!(result.response, Response::failure("unknown action: explode"));

    let result = store.dispatch_json(r#"{"text":"cat"}"#);
    assert_eq!(result.response, Response::failure("missing action"));

    let result = store.dispatch_json("not json");
    assert!(!result.response.is_ok());

    let result = store.dispatch_json(r#"{"action":"navigate"}"#);
    match result.response {
        Response::Failure { error, .. } => assert!(error.starts_with("malformed navigate request")),
        other => panic!("unexpected response: {other:?}"),
    }
}
