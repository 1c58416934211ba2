//! 文档树数据模型
//!
//! - 节点保存在 slotmap arena 中，以 `NodeId` 寻址
//! - 元素节点带标签名与有序属性，文本节点保存可见文本（实体已解码）
//! - 序列化时重新转义 `&` `<` `>`，script/style 内容原样输出
//! - `Fragment` 是某个元素全部子节点的深拷贝，用于原样恢复

use compact_str::CompactString;
use slotmap::{new_key_type, SlotMap};
use std::fmt;

new_key_type! { pub struct NodeId; }

/// 合成根节点的标签名
pub const DOCUMENT_TAG: &str = "#document";

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

/// 内容按原文保存、不做实体编解码的元素
pub fn is_raw_text_tag(tag: &str) -> bool {
    tag.eq_ignore_ascii_case("script") || tag.eq_ignore_ascii_case("style")
}

#[derive(Debug)]
pub enum DocTreeError {
    InvalidNodeId,
    NotAnElement,
    NotAText,
    Detached,
    WouldCycle,
    Parse(String),
}

impl fmt::Display for DocTreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocTreeError::InvalidNodeId => write!(f, "invalid node id"),
            DocTreeError::NotAnElement => write!(f, "node is not an element"),
            DocTreeError::NotAText => write!(f, "node is not a text node"),
            DocTreeError::Detached => write!(f, "node is not attached to a parent"),
            DocTreeError::WouldCycle => write!(f, "cannot move node into its own subtree"),
            DocTreeError::Parse(msg) => write!(f, "failed to parse markup: {msg}"),
        }
    }
}

impl std::error::Error for DocTreeError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: CompactString,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element {
        tag: CompactString,
        attrs: Vec<Attribute>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// 快照中的一个节点（与 arena 无关的自有数据）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentNode {
    Element {
        tag: CompactString,
        attrs: Vec<Attribute>,
        children: Vec<FragmentNode>,
    },
    Text(String),
}

/// 元素子节点的深拷贝
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    nodes: Vec<FragmentNode>,
}

impl Fragment {
    pub fn nodes(&self) -> &[FragmentNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            write_fragment_node(node, false, &mut out);
        }
        out
    }
}

pub struct DocTree {
    arena: SlotMap<NodeId, Node>,
    root: NodeId,
}

impl Default for DocTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DocTree {
    pub fn new() -> Self {
        let mut arena = SlotMap::with_key();
        let root = arena.insert(Node::new(NodeKind::Element {
            tag: CompactString::from(DOCUMENT_TAG),
            attrs: Vec::new(),
        }));
        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// 第一个 `body` 元素；没有时退回根节点
    pub fn body(&self) -> NodeId {
        self.find_element("body").unwrap_or(self.root)
    }

    /// 存活节点数（含已脱离树但未释放的节点）
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains_key(id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.arena.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.arena.get(id)?.kind {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.arena.get(id)?.kind {
            NodeKind::Text(text) => Some(text.as_str()),
            NodeKind::Element { .. } => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.tag(id).is_some()
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.arena.insert(Node::new(NodeKind::Element {
            tag: CompactString::from(tag.to_ascii_lowercase()),
            attrs: Vec::new(),
        }))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.arena.insert(Node::new(NodeKind::Text(text.into())))
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), DocTreeError> {
        match &mut self.arena.get_mut(id).ok_or(DocTreeError::InvalidNodeId)?.kind {
            NodeKind::Text(current) => {
                *current = text.into();
                Ok(())
            }
            NodeKind::Element { .. } => Err(DocTreeError::NotAText),
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DocTreeError> {
        if !self.is_element(parent) {
            return Err(if self.contains(parent) {
                DocTreeError::NotAnElement
            } else {
                DocTreeError::InvalidNodeId
            });
        }
        if !self.contains(child) {
            return Err(DocTreeError::InvalidNodeId);
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(DocTreeError::WouldCycle);
        }

        self.detach(child);
        self.arena[child].parent = Some(parent);
        self.arena[parent].children.push(child);
        Ok(())
    }

    /// 用 `replacement` 原地替换 `old`，`old` 及其子树随后被释放
    pub fn replace_with(&mut self, old: NodeId, replacement: &[NodeId]) -> Result<(), DocTreeError> {
        let parent = self
            .arena
            .get(old)
            .ok_or(DocTreeError::InvalidNodeId)?
            .parent
            .ok_or(DocTreeError::Detached)?;

        for &id in replacement {
            if !self.contains(id) {
                return Err(DocTreeError::InvalidNodeId);
            }
            if id == old || self.is_ancestor_or_self(id, parent) {
                return Err(DocTreeError::WouldCycle);
            }
        }
        for &id in replacement {
            self.detach(id);
        }

        let index = self.arena[parent]
            .children
            .iter()
            .position(|&c| c == old)
            .ok_or(DocTreeError::Detached)?;

        for &id in replacement {
            self.arena[id].parent = Some(parent);
        }
        self.arena[parent]
            .children
            .splice(index..index + 1, replacement.iter().copied());
        self.arena[old].parent = None;
        self.free_subtree(old);
        Ok(())
    }

    /// 从父节点摘下，节点本身仍保留在 arena 中
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        if let Some(node) = self.arena.get_mut(parent) {
            node.children.retain(|&c| c != id);
        }
        if let Some(node) = self.arena.get_mut(id) {
            node.parent = None;
        }
        true
    }

    pub fn remove_subtree(&mut self, id: NodeId) -> Result<(), DocTreeError> {
        if id == self.root {
            return Err(DocTreeError::WouldCycle);
        }
        if !self.contains(id) {
            return Err(DocTreeError::InvalidNodeId);
        }
        self.detach(id);
        self.free_subtree(id);
        Ok(())
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current) {
                stack.extend(node.children);
            }
        }
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.parent(node) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    /// 是否仍可从根节点到达
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(id) && self.is_ancestor_or_self(self.root, id)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.arena.get(id)?.kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|a| a.name.eq_ignore_ascii_case(name))
                .map(|a| a.value.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DocTreeError> {
        let attrs = self.attrs_mut(id)?;
        match attrs.iter_mut().find(|a| a.name.eq_ignore_ascii_case(name)) {
            Some(attr) => attr.value = value.to_string(),
            None => attrs.push(Attribute {
                name: CompactString::from(name.to_ascii_lowercase()),
                value: value.to_string(),
            }),
        }
        Ok(())
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Result<bool, DocTreeError> {
        let attrs = self.attrs_mut(id)?;
        let before = attrs.len();
        attrs.retain(|a| !a.name.eq_ignore_ascii_case(name));
        Ok(attrs.len() != before)
    }

    fn attrs_mut(&mut self, id: NodeId) -> Result<&mut Vec<Attribute>, DocTreeError> {
        match &mut self.arena.get_mut(id).ok_or(DocTreeError::InvalidNodeId)?.kind {
            NodeKind::Element { attrs, .. } => Ok(attrs),
            NodeKind::Text(_) => Err(DocTreeError::NotAnElement),
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|value| value.split_ascii_whitespace().any(|c| c == class))
    }

    /// 元素自身的 `contenteditable` 声明；未声明或取值非法时返回 None（继承父级）
    pub fn editable_flag(&self, id: NodeId) -> Option<bool> {
        let value = self.attr(id, "contenteditable")?;
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "true" | "plaintext-only" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    /// 节点是否处于可编辑区域内（沿祖先链继承）
    pub fn is_editable(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(flag) = self.editable_flag(node) {
                return flag;
            }
            current = self.parent(node);
        }
        false
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.arena.get(current) else {
                continue;
            };
            match &node.kind {
                NodeKind::Text(text) => out.push_str(text),
                NodeKind::Element { .. } => stack.extend(node.children.iter().rev().copied()),
            }
        }
        out
    }

    /// 文档序中第一个匹配标签的元素
    pub fn find_element(&self, tag: &str) -> Option<NodeId> {
        let mut stack = vec![self.root];
        while let Some(current) = stack.pop() {
            if current != self.root
                && self.tag(current).is_some_and(|t| t.eq_ignore_ascii_case(tag))
            {
                return Some(current);
            }
            stack.extend(self.children(current).iter().rev().copied());
        }
        None
    }

    pub fn snapshot_children(&self, id: NodeId) -> Result<Fragment, DocTreeError> {
        if !self.is_element(id) {
            return Err(if self.contains(id) {
                DocTreeError::NotAnElement
            } else {
                DocTreeError::InvalidNodeId
            });
        }
        let nodes = self
            .children(id)
            .iter()
            .filter_map(|&child| self.snapshot_node(child))
            .collect();
        Ok(Fragment { nodes })
    }

    fn snapshot_node(&self, id: NodeId) -> Option<FragmentNode> {
        let node = self.arena.get(id)?;
        Some(match &node.kind {
            NodeKind::Text(text) => FragmentNode::Text(text.clone()),
            NodeKind::Element { tag, attrs } => FragmentNode::Element {
                tag: tag.clone(),
                attrs: attrs.clone(),
                children: node
                    .children
                    .iter()
                    .filter_map(|&child| self.snapshot_node(child))
                    .collect(),
            },
        })
    }

    /// 释放当前全部子节点，再按快照重建
    pub fn restore_children(&mut self, id: NodeId, fragment: &Fragment) -> Result<(), DocTreeError> {
        if !self.is_element(id) {
            return Err(if self.contains(id) {
                DocTreeError::NotAnElement
            } else {
                DocTreeError::InvalidNodeId
            });
        }

        let old = std::mem::take(&mut self.arena[id].children);
        for child in old {
            if let Some(node) = self.arena.get_mut(child) {
                node.parent = None;
            }
            self.free_subtree(child);
        }

        for node in &fragment.nodes {
            let child = self.build_fragment_node(node);
            self.arena[child].parent = Some(id);
            self.arena[id].children.push(child);
        }
        Ok(())
    }

    fn build_fragment_node(&mut self, node: &FragmentNode) -> NodeId {
        match node {
            FragmentNode::Text(text) => self.create_text(text.clone()),
            FragmentNode::Element {
                tag,
                attrs,
                children,
            } => {
                let id = self.arena.insert(Node::new(NodeKind::Element {
                    tag: tag.clone(),
                    attrs: attrs.clone(),
                }));
                for child in children {
                    let child_id = self.build_fragment_node(child);
                    self.arena[child_id].parent = Some(id);
                    self.arena[id].children.push(child_id);
                }
                id
            }
        }
    }

    pub fn inner_markup(&self, id: NodeId) -> String {
        let raw = self.tag(id).is_some_and(is_raw_text_tag);
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_node(child, raw, &mut out);
        }
        out
    }

    pub fn outer_markup(&self, id: NodeId) -> String {
        if id == self.root {
            return self.inner_markup(id);
        }
        let raw = self
            .parent(id)
            .and_then(|p| self.tag(p))
            .is_some_and(is_raw_text_tag);
        let mut out = String::new();
        self.write_node(id, raw, &mut out);
        out
    }

    /// `raw` 为真时文本原样输出（父元素是 script/style）
    fn write_node(&self, id: NodeId, raw: bool, out: &mut String) {
        let Some(node) = self.arena.get(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => write_text(text, raw, out),
            NodeKind::Element { tag, attrs } => {
                write_start_tag(tag, attrs, out);
                if is_void_tag(tag) {
                    return;
                }
                let raw = is_raw_text_tag(tag);
                for &child in &node.children {
                    self.write_node(child, raw, out);
                }
                write_end_tag(tag, out);
            }
        }
    }
}

fn write_start_tag(tag: &str, attrs: &[Attribute], out: &mut String) {
    out.push('<');
    out.push_str(tag);
    for attr in attrs {
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(&attr.value));
        out.push('"');
    }
    out.push('>');
}

fn write_end_tag(tag: &str, out: &mut String) {
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn write_text(text: &str, raw: bool, out: &mut String) {
    if raw {
        out.push_str(text);
    } else {
        out.push_str(&html_escape::encode_text(text));
    }
}

fn write_fragment_node(node: &FragmentNode, raw: bool, out: &mut String) {
    match node {
        FragmentNode::Text(text) => write_text(text, raw, out),
        FragmentNode::Element {
            tag,
            attrs,
            children,
        } => {
            write_start_tag(tag, attrs, out);
            if is_void_tag(tag) {
                return;
            }
            let raw = is_raw_text_tag(tag);
            for child in children {
                write_fragment_node(child, raw, out);
            }
            write_end_tag(tag, out);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/doc_tree.rs"]
mod tests;
