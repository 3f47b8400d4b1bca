//! Idea recall by keyword

use serde::Serialize;

use super::idea::Idea;

/// Maximum number of recalled ideas
pub const MAX_RECALL_RESULTS: usize = 3;

/// What the assistant gets back for a recalled idea
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecallHit {
    pub title: String,
    pub summary: String,
}

impl From<&Idea> for RecallHit {
    fn from(idea: &Idea) -> Self {
        Self {
            title: idea.title.clone(),
            summary: idea.summary.clone(),
        }
    }
}

/// Case-insensitive substring match of `query` against title and summary.
///
/// Keeps the order of `ideas` (most recent first) and returns at most
/// [`MAX_RECALL_RESULTS`] hits.
pub fn recall(ideas: &[Idea], query: &str) -> Vec<RecallHit> {
    let needle = query.to_lowercase();
    ideas
        .iter()
        .filter(|idea| {
            idea.title.to_lowercase().contains(&needle)
                || idea.summary.to_lowercase().contains(&needle)
        })
        .take(MAX_RECALL_RESULTS)
        .map(RecallHit::from)
        .collect()
}
