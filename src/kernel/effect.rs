use crate::models::NodeId;

use super::state::HighlightEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBlock {
    Start,
    Center,
    End,
    Nearest,
}

/// Requests the core hands back to its host; the core never performs them itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ScrollIntoView { node: NodeId, block: ScrollBlock },
    HighlightAdded(HighlightEntry),
}
