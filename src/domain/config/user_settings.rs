//! Per-user session preferences, persisted alongside ideas

use serde::{Deserialize, Serialize};

use crate::domain::error::{ConfigError, InvalidPresetError};
use crate::domain::voice::{VoicePreset, VoiceProfile};

/// Keys accepted by [`UserSettings::set`]
pub const SETTINGS_KEYS: &[&str] = &[
    "voice_preset",
    "hands_free",
    "vad_sensitivity",
    "auto_end_turn",
];

/// Sensitivity at or above which speech onset is detected eagerly
const HIGH_SENSITIVITY_THRESHOLD: f32 = 0.5;

/// User preferences for live sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub voice_preset: VoicePreset,
    pub hands_free: bool,
    pub vad_sensitivity: f32,
    pub auto_end_turn: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            voice_preset: VoicePreset::NotebookClean,
            hands_free: false,
            vad_sensitivity: 0.5,
            auto_end_turn: true,
        }
    }
}

impl UserSettings {
    /// Voice profile for the selected preset
    pub fn profile(&self) -> VoiceProfile {
        self.voice_preset.into()
    }

    /// Whether speech onset should be detected with high sensitivity
    pub fn high_start_sensitivity(&self) -> bool {
        self.vad_sensitivity >= HIGH_SENSITIVITY_THRESHOLD
    }

    /// Update one setting from its string form
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "voice_preset" => {
                self.voice_preset =
                    value
                        .parse()
                        .map_err(|e: InvalidPresetError| ConfigError::ValidationError {
                            key: key.to_string(),
                            message: e.to_string(),
                        })?;
            }
            "hands_free" => self.hands_free = parse_bool(key, value)?,
            "auto_end_turn" => self.auto_end_turn = parse_bool(key, value)?,
            "vad_sensitivity" => {
                let parsed: f32 = value.parse().map_err(|_| ConfigError::ValidationError {
                    key: key.to_string(),
                    message: format!("'{}' is not a number", value),
                })?;
                if !(0.0..=1.0).contains(&parsed) {
                    return Err(ConfigError::ValidationError {
                        key: key.to_string(),
                        message: "must be between 0 and 1".to_string(),
                    });
                }
                self.vad_sensitivity = parsed;
            }
            _ => {
                return Err(ConfigError::ValidationError {
                    key: key.to_string(),
                    message: format!("Unknown setting. Valid keys: {}", SETTINGS_KEYS.join(", ")),
                });
            }
        }
        Ok(())
    }

    /// Read one setting as a display string
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "voice_preset" => Some(self.voice_preset.to_string()),
            "hands_free" => Some(self.hands_free.to_string()),
            "vad_sensitivity" => Some(self.vad_sensitivity.to_string()),
            "auto_end_turn" => Some(self.auto_end_turn.to_string()),
            _ => None,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("'{}' is not a boolean (use true or false)", value),
        }),
    }
}
