//! 宿主与核心之间的消息：封闭的请求集合与对应的响应形状

use serde::{Deserialize, Serialize};

use crate::services::SearchMode;

use super::state::HighlightEntry;

/// Every action name accepted on the wire, aliases included.
pub const ACTION_NAMES: &[&str] = &[
    "ping",
    "search",
    "highlight",
    "list-marks",
    "get-highlights",
    "navigate",
    "scroll-highlight",
    "step",
    "clear",
    "remove-highlight",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Request {
    Ping,
    #[serde(alias = "highlight")]
    Search(SearchParams),
    #[serde(alias = "get-highlights")]
    ListMarks,
    #[serde(alias = "scroll-highlight")]
    Navigate { index: i64 },
    Step { delta: i64 },
    #[serde(alias = "remove-highlight")]
    Clear {
        #[serde(default)]
        id: Option<u64>,
    },
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::Ping => "ping",
            Request::Search(_) => "search",
            Request::ListMarks => "list-marks",
            Request::Navigate { .. } => "navigate",
            Request::Step { .. } => "step",
            Request::Clear { .. } => "clear",
        }
    }

    pub fn is_known_action(name: &str) -> bool {
        ACTION_NAMES.contains(&name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub text: String,
    #[serde(default)]
    pub color: Option<String>,
    /// `true` 时按正则解释 `text`
    #[serde(default, alias = "isRegex")]
    pub pattern_mode: bool,
    #[serde(default, alias = "isCaseSensitive")]
    pub case_sensitive: bool,
    #[serde(default)]
    pub resume_at: Option<usize>,
}

impl SearchParams {
    pub fn mode(&self) -> SearchMode {
        SearchMode::from_regex_flag(self.pattern_mode)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkSummary {
    pub id: u64,
    pub text: String,
    pub color: String,
    pub count: usize,
}

impl From<&HighlightEntry> for MarkSummary {
    fn from(entry: &HighlightEntry) -> Self {
        Self {
            id: entry.id,
            text: entry.text.clone(),
            color: entry.color.clone(),
            count: entry.count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Count { ok: bool, count: usize },
    Failure { ok: bool, error: String },
    Marks { marks: Vec<MarkSummary> },
    Ack { ok: bool },
}

impl Response {
    pub fn ack() -> Self {
        Self::Ack { ok: true }
    }

    pub fn count(count: usize) -> Self {
        Self::Count { ok: true, count }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            ok: false,
            error: error.into(),
        }
    }

    pub fn marks<'a>(entries: impl IntoIterator<Item = &'a HighlightEntry>) -> Self {
        Self::Marks {
            marks: entries.into_iter().map(MarkSummary::from).collect(),
        }
    }

    pub fn is_ok(&self) -> bool {
        match self {
            Response::Count { ok, .. } | Response::Failure { ok, .. } | Response::Ack { ok } => {
                *ok
            }
            Response::Marks { .. } => true,
        }
    }

    pub fn to_json(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => json,
            Err(_) => r#"{"ok":false,"error":"response encoding failed"}"#.to_string(),
        }
    }
}
