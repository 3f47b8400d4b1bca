//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod audio_capture;
pub mod audio_output;
pub mod config;
pub mod live;
pub mod store;

// Re-export common types
pub use audio_capture::{AudioCapture, CaptureError, CaptureFrame};
pub use audio_output::{AudioOutput, OutputError};
pub use config::ConfigStore;
pub use live::{
    ActivityDetection, ClientMessage, FunctionCall, LiveChannel, LiveError, LiveService,
    LiveSetup, LiveWorkers, ServerEvent, ToolResponse,
};
pub use store::{IdeaStore, StoreError};
