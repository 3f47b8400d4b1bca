//! Chronological view of captured ideas

use chrono::{DateTime, Utc};

use super::idea::Idea;

/// Ideas newest first by creation time, whatever order they were stored in
pub fn timeline(ideas: &[Idea]) -> Vec<&Idea> {
    let mut sorted: Vec<&Idea> = ideas.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted
}

/// Label for how long ago `at` was, counted in whole elapsed days.
///
/// "Today", "Yesterday", "N days ago" within a week, then the calendar date.
/// Timestamps in the future count as today.
pub fn relative_day(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    match (now - at).num_days().max(0) {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        days @ 2..=6 => format!("{} days ago", days),
        _ => at.format("%Y-%m-%d").to_string(),
    }
}
