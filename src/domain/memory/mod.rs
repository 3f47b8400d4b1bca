//! Second-brain memory: ideas, links, and the rules that create and find them

mod auto_link;
mod idea;
mod recall;
mod timeline;
mod tools;

pub use auto_link::{propose_link, AUTO_LINK_RATIONALE, AUTO_LINK_STRENGTH};
pub use idea::{Idea, Link, VOICE_TRANSCRIPT};
pub use recall::{recall, RecallHit, MAX_RECALL_RESULTS};
pub use timeline::{relative_day, timeline};
pub use tools::{
    tool_declarations, FunctionDeclaration, ToolRequest, ToolRequestError, CREATE_IDEA,
    RECALL_IDEAS,
};
