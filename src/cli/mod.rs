//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, signal handling,
//! and the live session runner.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod memory_cmd;
pub mod presenter;
pub mod signals;

// Re-export commonly used types
pub use app::{run_session, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction, IdeasAction, LinksAction, SettingsAction};
pub use presenter::Presenter;
