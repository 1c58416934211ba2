//! HTML 加载：tree-sitter-html 语法树 -> DocTree
//!
//! 元素之间的字节区间成为文本节点：空白原样保留，字符引用解码为可见字符
//! （script/style 内容除外）。注释与 doctype 被丢弃。

use super::doc_tree::{is_raw_text_tag, DocTree, DocTreeError, NodeId};
use tree_sitter::{Node, Parser};

pub fn parse_html(source: &str) -> Result<DocTree, DocTreeError> {
    let mut parser = Parser::new();
    parser
        .set_language(tree_sitter_html::language())
        .map_err(|e| DocTreeError::Parse(e.to_string()))?;
    let syntax = parser
        .parse(source, None)
        .ok_or_else(|| DocTreeError::Parse("parser produced no tree".to_string()))?;

    let mut tree = DocTree::new();
    let root = tree.root();
    let document = syntax.root_node();
    build_children(
        &mut tree,
        root,
        document,
        document.start_byte(),
        document.end_byte(),
        source,
    )?;
    Ok(tree)
}

fn build_children(
    tree: &mut DocTree,
    parent: NodeId,
    node: Node<'_>,
    content_start: usize,
    content_end: usize,
    source: &str,
) -> Result<(), DocTreeError> {
    let mut walk = node.walk();
    let children: Vec<Node<'_>> = node.named_children(&mut walk).collect();

    let mut cursor = content_start;
    for child in children {
        if child.start_byte() < content_start || child.end_byte() > content_end {
            continue;
        }
        match child.kind() {
            "element" | "script_element" | "style_element" => {
                push_text(tree, parent, source, cursor, child.start_byte())?;
                build_element(tree, parent, child, source)?;
                cursor = child.end_byte();
            }
            "comment" | "doctype" | "erroneous_end_tag" => {
                push_text(tree, parent, source, cursor, child.start_byte())?;
                cursor = child.end_byte();
            }
            // text / raw_text 由区间覆盖
            _ => {}
        }
    }
    push_text(tree, parent, source, cursor, content_end)
}

fn build_element(
    tree: &mut DocTree,
    parent: NodeId,
    node: Node<'_>,
    source: &str,
) -> Result<(), DocTreeError> {
    let mut walk = node.walk();
    let children: Vec<Node<'_>> = node.named_children(&mut walk).collect();

    let Some(open) = children
        .iter()
        .copied()
        .find(|c| matches!(c.kind(), "start_tag" | "self_closing_tag"))
    else {
        return push_text(tree, parent, source, node.start_byte(), node.end_byte());
    };

    let element = read_tag(tree, open, source);
    tree.append_child(parent, element)?;

    if open.kind() == "self_closing_tag" {
        return Ok(());
    }

    let content_end = children
        .iter()
        .find(|c| c.kind() == "end_tag")
        .map(|c| c.start_byte())
        .unwrap_or_else(|| node.end_byte());
    build_children(tree, element, node, open.end_byte(), content_end, source)
}

fn read_tag(tree: &mut DocTree, open: Node<'_>, source: &str) -> NodeId {
    let mut walk = open.walk();
    let parts: Vec<Node<'_>> = open.named_children(&mut walk).collect();

    let tag = parts
        .iter()
        .find(|c| c.kind() == "tag_name")
        .map(|c| slice(source, c.start_byte(), c.end_byte()))
        .unwrap_or("span");
    let element = tree.create_element(tag);

    for attr in parts.iter().filter(|c| c.kind() == "attribute") {
        let mut attr_walk = attr.walk();
        let mut name = None;
        let mut value = String::new();
        for part in attr.named_children(&mut attr_walk) {
            match part.kind() {
                "attribute_name" => name = Some(slice(source, part.start_byte(), part.end_byte())),
                "attribute_value" => {
                    value = decode(slice(source, part.start_byte(), part.end_byte()))
                }
                "quoted_attribute_value" => {
                    // 去掉两侧引号
                    let (start, end) = (part.start_byte(), part.end_byte());
                    if end > start + 1 {
                        value = decode(slice(source, start + 1, end - 1));
                    }
                }
                _ => {}
            }
        }
        if let Some(name) = name {
            // 只在新建元素上设置属性，不会失败
            let _ = tree.set_attr(element, name, &value);
        }
    }
    element
}

fn push_text(
    tree: &mut DocTree,
    parent: NodeId,
    source: &str,
    start: usize,
    end: usize,
) -> Result<(), DocTreeError> {
    if start >= end {
        return Ok(());
    }
    let text = slice(source, start, end);
    if text.is_empty() {
        return Ok(());
    }
    let node = if tree.tag(parent).is_some_and(is_raw_text_tag) {
        tree.create_text(text)
    } else {
        tree.create_text(decode(text))
    };
    tree.append_child(parent, node)
}

fn decode(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

fn slice(source: &str, start: usize, end: usize) -> &str {
    source.get(start..end).unwrap_or("")
}

#[cfg(test)]
#[path = "../../tests/unit/models/html.rs"]
mod tests;
