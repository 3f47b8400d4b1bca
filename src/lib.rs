//! Second Voice - a voice-first second brain on the Gemini Live API
//!
//! Holds a real-time spoken conversation with the model: microphone audio is
//! streamed out, spoken replies are played back gaplessly, and the model's
//! tool calls capture and recall ideas in a local store.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Audio codecs, the session state machine, voice presets, and idea memory
//! - **Application**: The session controller, tool dispatcher, and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal, rodio, Gemini Live, JSON files, XDG config)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
