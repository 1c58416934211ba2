//! Highlight manager: owns the active search, its marks and the restore log.
//!
//! A search runs in four passes so that no restore record can observe a
//! half-mutated container:
//! 1. walk the visible text and plan the replacement for every segment
//! 2. capture a restore record for each container that will change
//! 3. apply in-place whitespace normalization (literal mode, `in-place` policy)
//! 4. swap matched segments for `[text] [marker] ... [text]` runs

use std::fmt;
use std::ops::Range;

use crate::models::{DocTree, DocTreeError, NodeId};
use crate::services::{
    collect_text_segments, compile_with_limit, normalize_whitespace, normalize_with_offsets,
    HighlightSettings, PatternError, PatternKey, SearchMode, SearchPattern, WalkPolicy,
    WhitespacePolicy,
};

use super::effect::{Effect, ScrollBlock};
use super::restore::RestoreLog;
use super::state::{ActiveSearchState, HighlightEntry, MarkId, MatchMark, SearchPhase};

pub const MARKER_TAG: &str = "span";
pub const MARK_ID_ATTR: &str = "data-zmark-id";
pub const CURRENT_ATTR: &str = "data-zmark-current";

#[derive(Debug)]
pub enum HighlightError {
    InvalidPattern(PatternError),
    Traversal(DocTreeError),
}

impl fmt::Display for HighlightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HighlightError::InvalidPattern(e) => write!(f, "{e}"),
            HighlightError::Traversal(e) => write!(f, "highlight failed: {e}"),
        }
    }
}

impl std::error::Error for HighlightError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HighlightError::InvalidPattern(e) => Some(e),
            HighlightError::Traversal(e) => Some(e),
        }
    }
}

impl From<PatternError> for HighlightError {
    fn from(value: PatternError) -> Self {
        Self::InvalidPattern(value)
    }
}

impl From<DocTreeError> for HighlightError {
    fn from(value: DocTreeError) -> Self {
        Self::Traversal(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub color: String,
    pub mode: SearchMode,
    pub case_sensitive: bool,
    pub resume_at: Option<usize>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, mode: SearchMode) -> Self {
        Self {
            query: query.into(),
            color: crate::services::settings::DEFAULT_HIGHLIGHT_COLOR.to_string(),
            mode,
            case_sensitive: false,
            resume_at: None,
        }
    }

    pub fn literal(query: impl Into<String>) -> Self {
        Self::new(query, SearchMode::Literal)
    }

    pub fn regex(query: impl Into<String>) -> Self {
        Self::new(query, SearchMode::Regex)
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn resume_at(mut self, index: usize) -> Self {
        self.resume_at = Some(index);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub entry_id: u64,
    pub match_count: usize,
    pub effects: Vec<Effect>,
}

enum Piece {
    Text(Range<usize>),
    Match(Range<usize>),
}

struct SegmentPlan {
    node: NodeId,
    /// literal 模式下的规范化文本（仅当与原文不同）
    rewrite: Option<String>,
    /// 匹配所在的文本，以及切分方式
    source: Option<(String, Vec<Piece>)>,
}

pub struct HighlightManager {
    settings: HighlightSettings,
    policy: WalkPolicy,
    state: ActiveSearchState,
    restore: RestoreLog,
    entries: Vec<HighlightEntry>,
    next_entry_id: u64,
}

impl Default for HighlightManager {
    fn default() -> Self {
        Self::new(HighlightSettings::default())
    }
}

impl HighlightManager {
    pub fn new(settings: HighlightSettings) -> Self {
        let policy = WalkPolicy::new(
            settings.skip_tags.iter().map(String::as_str),
            &settings.marker_class,
        );
        Self {
            settings,
            policy,
            state: ActiveSearchState::default(),
            restore: RestoreLog::default(),
            entries: Vec::new(),
            next_entry_id: 0,
        }
    }

    pub fn settings(&self) -> &HighlightSettings {
        &self.settings
    }

    pub fn phase(&self) -> SearchPhase {
        self.state.phase()
    }

    pub fn active_key(&self) -> Option<&PatternKey> {
        self.state.key()
    }

    pub fn marks(&self) -> &[MatchMark] {
        self.state.marks()
    }

    pub fn cursor(&self) -> usize {
        self.state.cursor()
    }

    pub fn entries(&self) -> &[HighlightEntry] {
        &self.entries
    }

    /// Number of restore records held for `key`.
    pub fn restore_records(&self, key: &PatternKey) -> usize {
        self.restore.journal(key).map_or(0, |j| j.len())
    }

    pub fn search(
        &mut self,
        tree: &mut DocTree,
        request: SearchRequest,
    ) -> Result<SearchOutcome, HighlightError> {
        self.next_entry_id += 1;
        let entry_id = self.next_entry_id;

        let key = PatternKey::new(&request.query, request.mode, request.case_sensitive);
        let mut resume_at = request.resume_at;
        if let Some(active) = self.state.key().cloned() {
            if active == key {
                resume_at = resume_at.or(Some(self.state.cursor()));
            } else {
                tracing::debug!(previous = %active, next = %key, "search superseded");
            }
            self.revert(tree, &active);
        }

        let pattern = match compile_with_limit(
            &request.query,
            request.mode,
            request.case_sensitive,
            self.settings.regex_size_limit,
        ) {
            Ok(pattern) => pattern,
            Err(error) => {
                tracing::warn!(query = %request.query, error = %error, "invalid search pattern");
                return Err(error.into());
            }
        };

        let plans = self.plan(tree, &pattern);

        if let Err(error) = self.capture_records(tree, &key, &plans) {
            // 尚未改动文档，直接丢弃本次记录
            self.restore.take(&key);
            tracing::error!(error = %error, "capture restore record failed");
            return Err(error.into());
        }

        for plan in &plans {
            if let (Some(text), None) = (&plan.rewrite, &plan.source) {
                if let Err(error) = tree.set_text(plan.node, text.clone()) {
                    tracing::warn!(error = %error, "whitespace rewrite failed");
                }
            }
        }

        let mut marks = Vec::new();
        let mut failure = None;
        for plan in plans {
            let Some((text, pieces)) = plan.source else {
                continue;
            };
            let replaced =
                self.replace_segment(tree, plan.node, &text, &pieces, &request.color, &mut marks);
            if let Err(error) = replaced {
                failure = Some(error);
                break;
            }
        }

        let count = marks.len();
        let cursor = resume_at.filter(|&c| c < count).unwrap_or(0);
        self.state.commit(key.clone(), marks, cursor);
        if self.restore.journal(&key).is_some_and(|j| j.is_empty()) {
            self.restore.take(&key);
        }

        if let Some(error) = failure {
            tracing::error!(key = %key, committed = count, error = %error, "highlight aborted");
            return Err(error.into());
        }

        let mut effects = Vec::new();
        if count > 0 {
            let entry = HighlightEntry {
                id: entry_id,
                text: key.query().to_string(),
                color: request.color,
                count,
                key: key.clone(),
            };
            self.entries.push(entry.clone());
            effects.push(Effect::HighlightAdded(entry));
        }

        tracing::info!(key = %key, matches = count, "search committed");
        Ok(SearchOutcome {
            entry_id,
            match_count: count,
            effects,
        })
    }

    fn plan(&self, tree: &DocTree, pattern: &SearchPattern) -> Vec<SegmentPlan> {
        let literal = pattern.mode() == SearchMode::Literal;
        let mut plans = Vec::new();

        for node in collect_text_segments(tree, tree.body(), &self.policy) {
            let Some(text) = tree.text(node) else {
                continue;
            };

            let plan = match (literal, self.settings.whitespace) {
                (false, _) => SegmentPlan {
                    node,
                    rewrite: None,
                    source: split(text, pattern.find_all(text)).map(|p| (text.to_string(), p)),
                },
                (true, WhitespacePolicy::InPlace) => {
                    let normalized = normalize_whitespace(text);
                    let pieces = split(&normalized, pattern.find_all(&normalized));
                    SegmentPlan {
                        node,
                        rewrite: (normalized != text).then(|| normalized.clone()),
                        source: pieces.map(|p| (normalized, p)),
                    }
                }
                (true, WhitespacePolicy::Scratch) => {
                    let scratch = normalize_with_offsets(text);
                    let ranges = pattern
                        .find_all(scratch.as_str())
                        .into_iter()
                        .filter_map(|r| scratch.to_source_range(r))
                        .collect();
                    SegmentPlan {
                        node,
                        rewrite: None,
                        source: split(text, ranges).map(|p| (text.to_string(), p)),
                    }
                }
            };
            plans.push(plan);
        }
        plans
    }

    fn capture_records(
        &mut self,
        tree: &DocTree,
        key: &PatternKey,
        plans: &[SegmentPlan],
    ) -> Result<(), DocTreeError> {
        let journal = self.restore.journal_mut(key);
        for plan in plans.iter().filter(|p| p.source.is_some()) {
            let container = tree.parent(plan.node).ok_or(DocTreeError::Detached)?;
            journal.capture(tree, container)?;
        }
        Ok(())
    }

    fn replace_segment(
        &mut self,
        tree: &mut DocTree,
        node: NodeId,
        text: &str,
        pieces: &[Piece],
        color: &str,
        marks: &mut Vec<MatchMark>,
    ) -> Result<(), DocTreeError> {
        let mut created = Vec::with_capacity(pieces.len());
        let mut pending = Vec::new();

        let result = self
            .build_pieces(tree, text, pieces, color, &mut created, &mut pending)
            .and_then(|()| tree.replace_with(node, &created));
        if let Err(error) = result {
            for id in created {
                let _ = tree.remove_subtree(id);
            }
            return Err(error);
        }

        for (id, marker, matched) in pending {
            marks.push(MatchMark {
                id,
                node: marker,
                text: matched,
                ordinal: marks.len(),
            });
        }
        Ok(())
    }

    fn build_pieces(
        &mut self,
        tree: &mut DocTree,
        text: &str,
        pieces: &[Piece],
        color: &str,
        created: &mut Vec<NodeId>,
        pending: &mut Vec<(MarkId, NodeId, String)>,
    ) -> Result<(), DocTreeError> {
        for piece in pieces {
            match piece {
                Piece::Text(range) => created.push(tree.create_text(&text[range.clone()])),
                Piece::Match(range) => {
                    let matched = &text[range.clone()];
                    let id = self.state.next_mark_id();
                    let marker = self.create_marker(tree, id, matched, color)?;
                    created.push(marker);
                    pending.push((id, marker, matched.to_string()));
                }
            }
        }
        Ok(())
    }

    fn create_marker(
        &self,
        tree: &mut DocTree,
        id: MarkId,
        text: &str,
        color: &str,
    ) -> Result<NodeId, DocTreeError> {
        let marker = tree.create_element(MARKER_TAG);
        tree.set_attr(marker, "class", &self.settings.marker_class)?;
        tree.set_attr(marker, "style", &format!("background-color: {color}"))?;
        tree.set_attr(marker, MARK_ID_ATTR, &id.0.to_string())?;
        let inner = tree.create_text(text);
        tree.append_child(marker, inner)?;
        Ok(marker)
    }

    /// Restores every container captured for `key`; returns the restored count.
    pub fn revert(&mut self, tree: &mut DocTree, key: &PatternKey) -> usize {
        let restored = self
            .restore
            .take(key)
            .map_or(0, |journal| journal.replay(tree));
        self.entries.retain(|e| &e.key != key);
        if self.state.key() == Some(key) {
            self.state.clear();
        }
        if restored > 0 {
            tracing::debug!(key = %key, restored, "highlights reverted");
        }
        restored
    }

    pub fn revert_all(&mut self, tree: &mut DocTree) -> usize {
        let mut keys = self.restore.keys();
        if let Some(active) = self.state.key() {
            if !keys.contains(active) {
                keys.push(active.clone());
            }
        }

        let restored: usize = keys.iter().map(|key| self.revert(tree, key)).sum();
        self.entries.clear();
        self.state.reset();
        self.next_entry_id = 0;
        restored
    }

    /// Reverts the search behind one listed entry.
    pub fn remove_entry(&mut self, tree: &mut DocTree, entry_id: u64) -> bool {
        let Some(key) = self
            .entries
            .iter()
            .find(|e| e.id == entry_id)
            .map(|e| e.key.clone())
        else {
            return false;
        };
        self.revert(tree, &key);
        true
    }

    /// Emphasizes the mark at `index` (wrapping out-of-range indices) and asks the
    /// host to center it.
    pub fn scroll_to(&mut self, tree: &mut DocTree, index: i64) -> Vec<Effect> {
        let len = self.state.marks().len();
        if self.state.phase() != SearchPhase::Active || len == 0 {
            return Vec::new();
        }
        let target = wrap_index(index, len);

        if let Some(previous) = self.state.focused() {
            if let Some(mark) = self.state.marks().get(previous) {
                let _ = tree.remove_attr(mark.node, CURRENT_ATTR);
            }
        }

        let node = self.state.marks()[target].node;
        if let Err(error) = tree.set_attr(node, CURRENT_ATTR, "true") {
            tracing::warn!(index = target, error = %error, "mark current failed");
        }
        self.state.focus(target);

        vec![Effect::ScrollIntoView {
            node,
            block: ScrollBlock::Center,
        }]
    }

    /// Relative navigation from the persisted cursor (+1 next, -1 previous).
    pub fn step(&mut self, tree: &mut DocTree, delta: i64) -> Vec<Effect> {
        let cursor = self.state.cursor() as i64;
        self.scroll_to(tree, cursor.saturating_add(delta))
    }
}

/// Below zero -> last, at or past the end -> first.
pub fn wrap_index(index: i64, len: usize) -> usize {
    if index < 0 {
        len.saturating_sub(1)
    } else if index as u64 >= len as u64 {
        0
    } else {
        index as usize
    }
}

fn split(text: &str, ranges: Vec<Range<usize>>) -> Option<Vec<Piece>> {
    if ranges.is_empty() {
        return None;
    }
    let mut pieces = Vec::with_capacity(ranges.len() * 2 + 1);
    let mut last = 0;
    for range in ranges {
        if range.start > last {
            pieces.push(Piece::Text(last..range.start));
        }
        last = range.end;
        pieces.push(Piece::Match(range));
    }
    if last < text.len() {
        pieces.push(Piece::Text(last..text.len()));
    }
    Some(pieces)
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/manager.rs"]
mod tests;
