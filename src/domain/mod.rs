//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod audio;
pub mod config;
pub mod error;
pub mod memory;
pub mod session;
pub mod voice;

// Re-export common types
pub use audio::{DecodedAudio, PcmChunk, PlaybackSchedule};
pub use config::{AppConfig, UserSettings};
pub use error::*;
pub use memory::{Idea, Link, RecallHit, ToolRequest};
pub use session::{SessionEvent, SessionMachine, SessionState};
pub use voice::{SystemInstruction, VoicePreset, VoiceProfile};
