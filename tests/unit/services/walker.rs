use super::*;

fn texts(tree: &DocTree, ids: &[NodeId]) -> Vec<String> {
    ids.iter()
        .map(|&id| tree.text(id).unwrap_or_default().to_string())
        .collect()
}

fn el(tree: &mut DocTree, parent: NodeId, tag: &str) -> NodeId {
    let id = tree.create_element(tag);
    tree.append_child(parent, id).unwrap();
    id
}

fn txt(tree: &mut DocTree, parent: NodeId, text: &str) -> NodeId {
    let id = tree.create_text(text);
    tree.append_child(parent, id).unwrap();
    id
}

#[test]
fn visits_text_in_document_order() {
    let mut tree = DocTree::new();
    let root = tree.root();
    let p = el(&mut tree, root, "p");
    txt(&mut tree, p, "one");
    let b = el(&mut tree, p, "b");
    txt(&mut tree, b, "two");
    txt(&mut tree, p, "three");

    let ids = collect_text_segments(&tree, root, &WalkPolicy::default());
    assert_eq!(texts(&tree, &ids), vec!["one", "two", "three"]);
}

#[test]
fn skips_scripts_styles_and_noscript() {
    let mut tree = DocTree::new();
    let root = tree.root();
    for tag in ["script", "style", "noscript", "template"] {
        let e = el(&mut tree, root, tag);
        txt(&mut tree, e, "hidden");
    }
    txt(&mut tree, root, "shown");

    let ids = collect_text_segments(&tree, root, &WalkPolicy::default());
    assert_eq!(texts(&tree, &ids), vec!["shown"]);
}

#[test]
fn skips_existing_markers_and_editable_regions() {
    let mut tree = DocTree::new();
    let root = tree.root();
    let mark = el(&mut tree, root, "span");
    tree.set_attr(mark, "class", DEFAULT_MARKER_CLASS).unwrap();
    txt(&mut tree, mark, "marked");

    let editor = el(&mut tree, root, "div");
    tree.set_attr(editor, "contenteditable", "true").unwrap();
    let nested = el(&mut tree, editor, "p");
    txt(&mut tree, nested, "typing");
    let locked = el(&mut tree, editor, "span");
    tree.set_attr(locked, "contenteditable", "false").unwrap();
    txt(&mut tree, locked, "locked");

    txt(&mut tree, root, "plain");

    let ids = collect_text_segments(&tree, root, &WalkPolicy::default());
    assert_eq!(texts(&tree, &ids), vec!["plain"]);
}

#[test]
fn custom_policy_and_excluded_start() {
    let mut tree = DocTree::new();
    let root = tree.root();
    let aside = el(&mut tree, root, "aside");
    let inner = el(&mut tree, aside, "p");
    txt(&mut tree, inner, "side");
    txt(&mut tree, root, "main");

    let policy = WalkPolicy::new(["ASIDE"], "hl");
    let ids = collect_text_segments(&tree, root, &policy);
    assert_eq!(texts(&tree, &ids), vec!["main"]);
    assert!(collect_text_segments(&tree, inner, &policy).is_empty());
}
