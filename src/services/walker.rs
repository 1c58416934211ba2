//! 可见文本遍历
//!
//! 按文档序收集文本节点，整棵跳过：脚本/样式等不渲染容器、
//! 引擎自己生成的标记元素、以及可编辑区域。

use crate::models::{DocTree, NodeId};
use compact_str::CompactString;

/// 标记元素的保留 class
pub const DEFAULT_MARKER_CLASS: &str = "page-highlighter-highlight";

pub const DEFAULT_SKIP_TAGS: &[&str] = &["script", "style", "noscript", "template"];

#[derive(Debug, Clone)]
pub struct WalkPolicy {
    skip_tags: Vec<CompactString>,
    marker_class: CompactString,
}

impl Default for WalkPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SKIP_TAGS.iter().copied(), DEFAULT_MARKER_CLASS)
    }
}

impl WalkPolicy {
    pub fn new<'a>(skip_tags: impl IntoIterator<Item = &'a str>, marker_class: &str) -> Self {
        Self {
            skip_tags: skip_tags
                .into_iter()
                .map(|t| CompactString::from(t.to_ascii_lowercase()))
                .collect(),
            marker_class: CompactString::from(marker_class),
        }
    }

    pub fn marker_class(&self) -> &str {
        &self.marker_class
    }

    fn skips_tag(&self, tag: &str) -> bool {
        self.skip_tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// 元素是否连同子树一起被排除；`editable` 为继承下来的可编辑状态
    fn prunes(&self, tree: &DocTree, id: NodeId, editable: bool) -> bool {
        let Some(tag) = tree.tag(id) else {
            return false;
        };
        self.skips_tag(tag) || tree.has_class(id, &self.marker_class) || editable
    }
}

pub fn collect_text_segments(tree: &DocTree, root: NodeId, policy: &WalkPolicy) -> Vec<NodeId> {
    let mut segments = Vec::new();
    if !tree.contains(root) {
        return segments;
    }

    // 起点之上的祖先也可能禁止访问
    let inherited = tree.parent(root).is_some_and(|p| tree.is_editable(p));
    let mut excluded_above = false;
    let mut ancestor = tree.parent(root);
    while let Some(id) = ancestor {
        if policy.prunes(tree, id, false) {
            excluded_above = true;
            break;
        }
        ancestor = tree.parent(id);
    }
    if excluded_above {
        return segments;
    }

    let mut stack = vec![(root, inherited)];
    while let Some((id, inherited)) = stack.pop() {
        if tree.text(id).is_some() {
            segments.push(id);
            continue;
        }

        let editable = tree.editable_flag(id).unwrap_or(inherited);
        if policy.prunes(tree, id, editable) {
            continue;
        }
        stack.extend(
            tree.children(id)
                .iter()
                .rev()
                .map(|&child| (child, editable)),
        );
    }
    segments
}

#[cfg(test)]
#[path = "../../tests/unit/services/walker.rs"]
mod tests;
