use crate::models::NodeId;
use crate::services::PatternKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkId(pub u64);

/// One highlighted occurrence backed by a marker element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchMark {
    pub id: MarkId,
    pub node: NodeId,
    pub text: String,
    pub ordinal: usize,
}

/// Summary of one committed search, as listed back to the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightEntry {
    pub id: u64,
    pub text: String,
    pub color: String,
    pub count: usize,
    pub key: PatternKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Active,
}

#[derive(Debug, Default)]
pub struct ActiveSearchState {
    key: Option<PatternKey>,
    marks: Vec<MatchMark>,
    next_mark_seq: u64,
    cursor: usize,
    focused: Option<usize>,
}

impl ActiveSearchState {
    pub fn phase(&self) -> SearchPhase {
        if self.key.is_some() {
            SearchPhase::Active
        } else {
            SearchPhase::Idle
        }
    }

    pub fn key(&self) -> Option<&PatternKey> {
        self.key.as_ref()
    }

    pub fn marks(&self) -> &[MatchMark] {
        &self.marks
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    /// Sequence numbers keep growing across searches; only `reset` rewinds them.
    pub fn next_mark_id(&mut self) -> MarkId {
        self.next_mark_seq += 1;
        MarkId(self.next_mark_seq)
    }

    pub fn commit(&mut self, key: PatternKey, marks: Vec<MatchMark>, cursor: usize) {
        self.key = Some(key);
        self.marks = marks;
        self.cursor = cursor;
        self.focused = None;
    }

    pub fn focus(&mut self, index: usize) {
        self.cursor = index;
        self.focused = Some(index);
    }

    /// Back to `Idle`; the sequence counter is kept.
    pub fn clear(&mut self) {
        self.key = None;
        self.marks.clear();
        self.cursor = 0;
        self.focused = None;
    }

    pub fn reset(&mut self) {
        self.clear();
        self.next_mark_seq = 0;
    }
}
