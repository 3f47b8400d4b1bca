//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::voice::VoicePreset;

/// Second Voice - talk to your second brain
#[derive(Parser, Debug)]
#[command(name = "second-voice")]
#[command(version)]
#[command(about = "Voice-first idea capture using the Google Gemini Live API")]
#[command(long_about = None)]
pub struct Cli {
    /// Voice preset for this session (overrides the saved setting)
    #[arg(long, value_name = "PRESET")]
    pub voice: Option<VoicePreset>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Browse and manage captured ideas
    Ideas {
        #[command(subcommand)]
        action: IdeasAction,
    },
    /// Inspect links between ideas
    Links {
        #[command(subcommand)]
        action: LinksAction,
    },
    /// View or change session preferences
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// List available voice presets
    Presets,
    /// Delete every idea, link, and saved setting
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Idea subcommands
#[derive(Subcommand, Debug)]
pub enum IdeasAction {
    /// List ideas, most recent first
    List,
    /// Search ideas by title or summary
    Recall {
        /// Text to look for
        query: String,
    },
    /// Delete an idea and its links
    Delete {
        /// Idea id
        id: String,
    },
    /// Show ideas by when they were captured
    Timeline,
    /// Write every idea to a JSON file
    Export {
        /// Destination file
        #[arg(default_value = DEFAULT_EXPORT_FILE)]
        path: PathBuf,
    },
}

/// Export destination when none is given
pub const DEFAULT_EXPORT_FILE: &str = "second_voice_backup.json";

/// Link subcommands
#[derive(Subcommand, Debug)]
pub enum LinksAction {
    /// List links
    List,
}

/// Settings subcommands
#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Show current settings
    Show,
    /// Change a setting
    Set {
        /// Setting key
        key: String,
        /// New value
        value: String,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &["api_key", "model", "data_dir"];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
