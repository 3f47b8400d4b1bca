//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with external systems like audio devices, the Gemini Live API,
//! and the local filesystem.

pub mod config;
pub mod live;
pub mod playback;
pub mod recording;
pub mod storage;

// Re-export adapters
pub use config::{default_data_dir, XdgConfigStore};
pub use live::GeminiLiveService;
pub use playback::RodioOutput;
pub use recording::CpalCapture;
pub use storage::JsonFileStore;
