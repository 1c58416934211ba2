//! Headless highlight core (state/action/effect).

pub mod action;
pub mod effect;
pub mod manager;
pub mod restore;
pub mod state;
pub mod store;

pub use action::{MarkSummary, Request, Response, SearchParams};
pub use effect::{Effect, ScrollBlock};
pub use manager::{HighlightError, HighlightManager, SearchOutcome, SearchRequest};
pub use restore::{RestoreJournal, RestoreLog, RestoreRecord};
pub use state::{ActiveSearchState, HighlightEntry, MarkId, MatchMark, SearchPhase};
pub use store::{DispatchResult, Store};
