//! Domain error types

use thiserror::Error;

/// Error when an unknown voice preset name is provided
#[derive(Debug, Clone, Error)]
#[error("Invalid voice preset: \"{input}\". Valid presets are: Notebook-Clean, Reflective, Creative, Analytical, Gentle")]
pub struct InvalidPresetError {
    pub input: String,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}

/// Error when a reply audio frame cannot be decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Audio frame is empty")]
    Empty,

    #[error("Audio frame is not valid base64: {0}")]
    InvalidBase64(String),

    #[error("Audio frame has odd byte length {0}, expected 16-bit samples")]
    OddLength(usize),
}
