//! 模式引擎
//!
//! - Literal 模式：压缩空白后转义全部元字符，纯子串匹配
//! - Regex 模式：原样编译，从不改动空白
//!
//! 两种模式都编译为 `regex::Regex`，匹配语义为全局、不重叠、最左优先。

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// 默认的正则编译体积上限
pub const DEFAULT_REGEX_SIZE_LIMIT: usize = 2 * (1 << 20);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchMode {
    #[default]
    Literal,
    Regex,
}

impl SearchMode {
    pub fn from_regex_flag(is_regex: bool) -> Self {
        if is_regex {
            Self::Regex
        } else {
            Self::Literal
        }
    }

    pub fn is_regex(self) -> bool {
        matches!(self, Self::Regex)
    }
}

/// 一次逻辑搜索的身份：(规范化查询, 模式, 大小写敏感)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternKey {
    query: String,
    mode: SearchMode,
    case_sensitive: bool,
}

impl PatternKey {
    pub fn new(raw_query: &str, mode: SearchMode, case_sensitive: bool) -> Self {
        let query = match mode {
            SearchMode::Literal => normalize_whitespace(raw_query),
            SearchMode::Regex => raw_query.to_string(),
        };
        Self {
            query,
            mode,
            case_sensitive,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }
}

impl fmt::Display for PatternKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.query,
            self.mode.is_regex(),
            self.case_sensitive
        )
    }
}

#[derive(Debug)]
pub enum PatternError {
    Invalid { query: String, source: regex::Error },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::Invalid { source, .. } => write!(f, "invalid regex pattern: {source}"),
        }
    }
}

impl std::error::Error for PatternError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PatternError::Invalid { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchPattern {
    key: PatternKey,
    regex: Regex,
}

pub fn compile(
    query: &str,
    mode: SearchMode,
    case_sensitive: bool,
) -> Result<SearchPattern, PatternError> {
    compile_with_limit(query, mode, case_sensitive, DEFAULT_REGEX_SIZE_LIMIT)
}

pub fn compile_with_limit(
    query: &str,
    mode: SearchMode,
    case_sensitive: bool,
    size_limit: usize,
) -> Result<SearchPattern, PatternError> {
    let key = PatternKey::new(query, mode, case_sensitive);
    let source = match mode {
        SearchMode::Literal => regex::escape(key.query()),
        SearchMode::Regex => key.query().to_string(),
    };
    let regex = RegexBuilder::new(&source)
        .case_insensitive(!case_sensitive)
        .size_limit(size_limit)
        .build()
        .map_err(|source| PatternError::Invalid {
            query: key.query().to_string(),
            source,
        })?;
    Ok(SearchPattern { key, regex })
}

impl SearchPattern {
    pub fn key(&self) -> &PatternKey {
        &self.key
    }

    pub fn mode(&self) -> SearchMode {
        self.key.mode
    }

    /// 至少有一个非空匹配
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.find_iter(text).any(|m| !m.is_empty())
    }

    /// 全部非空匹配的字节区间（不重叠、按出现顺序）
    pub fn find_all(&self, text: &str) -> Vec<Range<usize>> {
        self.regex
            .find_iter(text)
            .filter(|m| !m.is_empty())
            .map(|m| m.range())
            .collect()
    }
}

#[inline]
fn is_space(ch: char) -> bool {
    ch.is_whitespace() || ch == '\u{feff}'
}

/// 连续空白压缩为单个空格，并去掉首尾空白
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split(is_space).filter(|w| !w.is_empty()) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// 规范化后的文本，以及每个字节到原文的映射
#[derive(Debug, Clone, Default)]
pub struct NormalizedText {
    text: String,
    starts: Vec<usize>,
    ends: Vec<usize>,
}

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// 规范化文本中的区间 -> 原文区间；被压缩的空格对应整段原始空白
    pub fn to_source_range(&self, range: Range<usize>) -> Option<Range<usize>> {
        if range.is_empty() {
            return None;
        }
        let start = *self.starts.get(range.start)?;
        let end = *self.ends.get(range.end - 1)?;
        Some(start..end)
    }
}

pub fn normalize_with_offsets(source: &str) -> NormalizedText {
    let mut out = NormalizedText {
        text: String::with_capacity(source.len()),
        starts: Vec::with_capacity(source.len()),
        ends: Vec::with_capacity(source.len()),
    };
    let mut pending_space: Option<(usize, usize)> = None;

    for (index, ch) in source.char_indices() {
        let end = index + ch.len_utf8();
        if is_space(ch) {
            pending_space = Some(match pending_space {
                Some((start, _)) => (start, end),
                None => (index, end),
            });
            continue;
        }

        if let Some((start, run_end)) = pending_space.take() {
            if !out.text.is_empty() {
                out.text.push(' ');
                out.starts.push(start);
                out.ends.push(run_end);
            }
        }

        let before = out.text.len();
        out.text.push(ch);
        for _ in before..out.text.len() {
            out.starts.push(index);
            out.ends.push(end);
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/services/pattern.rs"]
mod tests;
