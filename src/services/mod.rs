//! 服务层
//!
//! - pattern: 查询串编译为匹配器
//! - walker: 可见文本节点遍历
//! - settings: JSON 配置文件

pub mod pattern;
pub mod settings;
pub mod walker;

pub use pattern::{
    compile, compile_with_limit, normalize_whitespace, normalize_with_offsets, NormalizedText,
    PatternError, PatternKey, SearchMode, SearchPattern,
};
pub use settings::{HighlightSettings, Settings, WhitespacePolicy};
pub use walker::{collect_text_segments, WalkPolicy};
