//! Auto-linking rule for newly captured ideas

use super::idea::{Idea, Link};

/// Strength of every auto-created link
pub const AUTO_LINK_STRENGTH: f64 = 0.8;

/// Rationale recorded on every auto-created link
pub const AUTO_LINK_RATIONALE: &str = "Shared themes";

/// Propose a link from `new_idea` to the first idea in `existing` (persistence
/// order) that shares a tag with it.
///
/// At most one link is proposed no matter how many ideas match. `existing` may
/// contain `new_idea` itself; it is skipped.
pub fn propose_link(new_idea: &Idea, existing: &[Idea]) -> Option<Link> {
    existing
        .iter()
        .filter(|other| other.id != new_idea.id)
        .find(|other| new_idea.shares_tag_with(other))
        .map(|target| {
            Link::new(
                new_idea.id,
                target.id,
                AUTO_LINK_STRENGTH,
                AUTO_LINK_RATIONALE,
            )
        })
}
