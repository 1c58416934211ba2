//! 数据模型层

pub mod doc_tree;
pub mod html;

pub use doc_tree::{
    is_raw_text_tag, is_void_tag, Attribute, DocTree, DocTreeError, Fragment, FragmentNode, Node, NodeId, NodeKind,
    DOCUMENT_TAG,
};
pub use html::parse_html;
