//! Idea and Link records

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transcript placeholder for ideas captured in a live session
pub const VOICE_TRANSCRIPT: &str = "Captured via voice";

/// A persisted, structured memory record distilled from conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    pub raw_transcript: String,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    pub last_referenced_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl Idea {
    /// Create an idea captured by voice at `now`
    pub fn capture<I, S>(
        title: impl Into<String>,
        summary: impl Into<String>,
        tags: I,
        now: DateTime<Utc>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            summary: summary.into(),
            raw_transcript: VOICE_TRANSCRIPT.to_string(),
            confidence: 1.0,
            created_at: now,
            last_referenced_at: now,
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the two ideas have at least one tag in common
    pub fn shares_tag_with(&self, other: &Idea) -> bool {
        !self.tags.is_disjoint(&other.tags)
    }
}

/// A directed association between two ideas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: Uuid,
    pub source_idea_id: Uuid,
    pub target_idea_id: Uuid,
    pub strength: f64,
    pub rationale: String,
}

impl Link {
    /// Create a link with a fresh id. Strength is clamped to [0, 1].
    pub fn new(source: Uuid, target: Uuid, strength: f64, rationale: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_idea_id: source,
            target_idea_id: target,
            strength: strength.clamp(0.0, 1.0),
            rationale: rationale.into(),
        }
    }

    /// Whether either endpoint is `idea_id`
    pub fn touches(&self, idea_id: &Uuid) -> bool {
        self.source_idea_id == *idea_id || self.target_idea_id == *idea_id
    }
}
