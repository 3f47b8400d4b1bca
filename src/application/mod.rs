//! Application layer - Use cases and port interfaces
//!
//! Contains the core business operations and trait definitions
//! for external system interactions.

pub mod dispatcher;
pub mod pipeline;
pub mod ports;
pub mod session;

// Re-export use cases
pub use dispatcher::{DispatchError, ToolDispatcher};
pub use pipeline::{encode_capture_frame, EncodedFrame, PlaybackError, PlaybackPath};
pub use session::{SessionCallbacks, SessionConfig, SessionController, SessionError};
