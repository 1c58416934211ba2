use crate::models::DocTree;
use crate::services::HighlightSettings;

use super::action::{Request, SearchParams};
use super::manager::{HighlightManager, SearchRequest};
use super::{Effect, Response};

pub struct DispatchResult {
    pub response: Response,
    pub effects: Vec<Effect>,
}

impl DispatchResult {
    fn reply(response: Response) -> Self {
        Self {
            response,
            effects: Vec::new(),
        }
    }
}

/// 持有一份已加载的文档及其高亮状态，按请求逐个同步处理
pub struct Store {
    tree: DocTree,
    manager: HighlightManager,
}

impl Store {
    pub fn new(tree: DocTree, settings: HighlightSettings) -> Self {
        Self {
            tree,
            manager: HighlightManager::new(settings),
        }
    }

    pub fn tree(&self) -> &DocTree {
        &self.tree
    }

    pub fn manager(&self) -> &HighlightManager {
        &self.manager
    }

    pub fn into_tree(self) -> DocTree {
        self.tree
    }

    pub fn dispatch(&mut self, request: Request) -> DispatchResult {
        tracing::debug!(action = request.name(), "dispatch");
        match request {
            Request::Ping => DispatchResult::reply(Response::ack()),
            Request::Search(params) => self.dispatch_search(params),
            Request::ListMarks => DispatchResult::reply(Response::marks(self.manager.entries())),
            Request::Navigate { index } => DispatchResult {
                effects: self.manager.scroll_to(&mut self.tree, index),
                response: Response::ack(),
            },
            Request::Step { delta } => DispatchResult {
                effects: self.manager.step(&mut self.tree, delta),
                response: Response::ack(),
            },
            Request::Clear { id } => {
                // 面板发来的 id 可能不是条目 id，对不上时整体清除
                let removed = id.is_some_and(|id| self.manager.remove_entry(&mut self.tree, id));
                if !removed {
                    self.manager.revert_all(&mut self.tree);
                }
                DispatchResult::reply(Response::ack())
            }
        }
    }

    /// Parses one JSON request; anything that is not a known, well-formed request gets a
    /// failure response instead of an error.
    pub fn dispatch_json(&mut self, line: &str) -> DispatchResult {
        let value: serde_json::Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "malformed request");
                return DispatchResult::reply(Response::failure(format!("malformed request: {e}")));
            }
        };

        let action = value
            .get("action")
            .and_then(|a| a.as_str())
            .map(str::to_string);
        match serde_json::from_value::<Request>(value) {
            Ok(request) => self.dispatch(request),
            Err(e) => {
                let error = match action {
                    None => "missing action".to_string(),
                    Some(name) if !Request::is_known_action(&name) => {
                        format!("unknown action: {name}")
                    }
                    Some(name) => format!("malformed {name} request: {e}"),
                };
                tracing::warn!(error = %error, "rejected request");
                DispatchResult::reply(Response::failure(error))
            }
        }
    }

    fn dispatch_search(&mut self, params: SearchParams) -> DispatchResult {
        let color = params
            .color
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.manager.settings().default_color.clone());
        let mut request = SearchRequest::new(params.text.clone(), params.mode())
            .color(color)
            .case_sensitive(params.case_sensitive);
        if let Some(index) = params.resume_at {
            request = request.resume_at(index);
        }

        match self.manager.search(&mut self.tree, request) {
            Ok(outcome) => DispatchResult {
                response: Response::count(outcome.match_count),
                effects: outcome.effects,
            },
            Err(e) => DispatchResult::reply(Response::failure(e.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/store.rs"]
mod tests;
