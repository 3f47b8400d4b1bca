//! Tool dispatcher: turns model function calls into idea store side effects

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::ports::{FunctionCall, IdeaStore, StoreError, ToolResponse};
use crate::domain::memory::{propose_link, recall, Idea, ToolRequest, ToolRequestError};

/// Reply sent after an idea is stored
pub const IDEA_SAVED: &str = "Idea saved successfully.";

/// Tool dispatch errors
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Request(#[from] ToolRequestError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DispatchError {
    /// Failure payload returned to the model
    pub fn to_payload(&self) -> Value {
        json!({ "status": "error", "message": self.to_string() })
    }
}

/// Executes `createIdea` and `recallIdeas` against an idea store
pub struct ToolDispatcher<S: IdeaStore + ?Sized> {
    store: Arc<S>,
}

impl<S: IdeaStore + ?Sized> ToolDispatcher<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The store calls are dispatched against
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Run one call. Failures are folded into an error payload so the
    /// conversation always gets an answer.
    pub async fn dispatch(&self, call: &FunctionCall) -> ToolResponse {
        let response = match self.execute(call).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(tool = %call.name, id = %call.id, error = %e, "Tool call failed");
                e.to_payload()
            }
        };

        ToolResponse {
            id: call.id.clone(),
            name: call.name.clone(),
            response,
        }
    }

    /// Run every call of one message in order
    pub async fn dispatch_all(&self, calls: &[FunctionCall]) -> Vec<ToolResponse> {
        let mut responses = Vec::with_capacity(calls.len());
        for call in calls {
            responses.push(self.dispatch(call).await);
        }
        responses
    }

    async fn execute(&self, call: &FunctionCall) -> Result<Value, DispatchError> {
        debug!(tool = %call.name, id = %call.id, "Dispatching tool call");

        match ToolRequest::parse(&call.name, &call.args)? {
            ToolRequest::CreateIdea {
                title,
                summary,
                tags,
            } => {
                let idea = Idea::capture(title, summary, tags, Utc::now());
                self.store.save_idea(idea.clone()).await?;
                info!(id = %idea.id, title = %idea.title, "Idea saved");

                let existing = self.store.ideas().await?;
                if let Some(link) = propose_link(&idea, &existing) {
                    debug!(source = %link.source_idea_id, target = %link.target_idea_id, "Auto-linked idea");
                    self.store.save_link(link).await?;
                }

                Ok(json!({ "result": IDEA_SAVED }))
            }
            ToolRequest::RecallIdeas { query } => {
                let ideas = self.store.ideas().await?;
                let found = recall(&ideas, &query);
                debug!(query = %query, hits = found.len(), "Recalled ideas");
                Ok(json!({ "found": found }))
            }
        }
    }
}
