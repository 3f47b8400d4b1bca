//! Voice preset value objects

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::InvalidPresetError;

/// All available voice presets
pub const ALL_PRESETS: &[VoicePreset] = &[
    VoicePreset::NotebookClean,
    VoicePreset::Reflective,
    VoicePreset::Creative,
    VoicePreset::Analytical,
    VoicePreset::Gentle,
];

/// Named voice personalities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VoicePreset {
    #[default]
    #[serde(rename = "Notebook-Clean")]
    NotebookClean,
    Reflective,
    Creative,
    Analytical,
    Gentle,
}

impl VoicePreset {
    /// Get the preset name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotebookClean => "Notebook-Clean",
            Self::Reflective => "Reflective",
            Self::Creative => "Creative",
            Self::Analytical => "Analytical",
            Self::Gentle => "Gentle",
        }
    }

    /// Prebuilt voice used by the live service
    pub const fn voice_name(&self) -> &'static str {
        match self {
            Self::NotebookClean => "Kore",
            Self::Reflective => "Fenrir",
            Self::Creative => "Puck",
            Self::Analytical => "Charon",
            Self::Gentle => "Zephyr",
        }
    }

    /// Tone modifier appended to the system instruction
    pub const fn tone_instruction(&self) -> &'static str {
        match self {
            Self::NotebookClean => "Speak clearly and concisely. Use a neutral, professional, yet warm tone like a skilled broadcaster. Maintain steady pacing.",
            Self::Reflective => "Be thoughtful and slow. Pause often to let the idea sink in. Act as a mirror to the users thoughts. Use deeper intonation.",
            Self::Creative => "Be energetic, enthusiastic, and quick to make connections. Use metaphor and varied sentence structure. Express excitement.",
            Self::Analytical => "Be precise, logical, and structured. Focus on facts and categorization. Minimal fluff. Enunciate clearly.",
            Self::Gentle => "Be very calm, soothing, and supportive. Ensure the user feels safe to explore vulnerable thoughts. Soften all edges.",
        }
    }

    /// Short description for listings
    pub const fn description(&self) -> &'static str {
        match self {
            Self::NotebookClean => "A crisp, professional broadcaster tone. Ideal for efficient note-taking, meeting summaries, and factual capture.",
            Self::Reflective => "A slow, deep, and thoughtful persona. Paces itself for journaling and deep self-reflection.",
            Self::Creative => "High energy, metaphorical, and dynamic. Designed to spark inspiration and rapid brainstorming.",
            Self::Analytical => "Pure logic. Precise, structured, and data-driven. Focuses on core arguments and the structure of your ideas.",
            Self::Gentle => "A soft, safe, and soothing presence. Patient and quiet, for decompressing or exploring vulnerable topics.",
        }
    }

    /// Default delivery details
    pub const fn details(&self) -> VoiceDetails {
        match self {
            Self::NotebookClean => VoiceDetails::new(0.6, 0.2, 0.5, 0.4, 0.0, 0.0),
            Self::Reflective => VoiceDetails::new(0.3, 0.8, 0.4, 0.6, 0.2, 0.2),
            Self::Creative => VoiceDetails::new(0.8, 0.4, 0.8, 0.7, 0.1, 0.4),
            Self::Analytical => VoiceDetails::new(0.6, 0.2, 0.7, 0.2, 0.0, 0.0),
            Self::Gentle => VoiceDetails::new(0.4, 0.5, 0.3, 0.9, 0.4, 0.1),
        }
    }
}

impl FromStr for VoicePreset {
    type Err = InvalidPresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "notebookclean" => Ok(Self::NotebookClean),
            "reflective" => Ok(Self::Reflective),
            "creative" => Ok(Self::Creative),
            "analytical" => Ok(Self::Analytical),
            "gentle" => Ok(Self::Gentle),
            _ => Err(InvalidPresetError { input: s.to_string() }),
        }
    }
}

impl fmt::Display for VoicePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delivery characteristics, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceDetails {
    pub pace: f32,
    pub pause_density: f32,
    pub emphasis: f32,
    pub warmth: f32,
    pub breathiness: f32,
    pub disfluency: f32,
}

impl VoiceDetails {
    pub const fn new(
        pace: f32,
        pause_density: f32,
        emphasis: f32,
        warmth: f32,
        breathiness: f32,
        disfluency: f32,
    ) -> Self {
        Self {
            pace,
            pause_density,
            emphasis,
            warmth,
            breathiness,
            disfluency,
        }
    }

    fn values(&self) -> [f32; 6] {
        [
            self.pace,
            self.pause_density,
            self.emphasis,
            self.warmth,
            self.breathiness,
            self.disfluency,
        ]
    }

    /// Whether every field lies in [0, 1]
    pub fn is_valid(&self) -> bool {
        self.values().iter().all(|v| (0.0..=1.0).contains(v))
    }
}

/// Static voice configuration consumed when a session opens.
/// Never mutated by the session.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceProfile {
    voice_name: String,
    tone_instruction: String,
    details: VoiceDetails,
}

impl VoiceProfile {
    pub fn new(
        voice_name: impl Into<String>,
        tone_instruction: impl Into<String>,
        details: VoiceDetails,
    ) -> Self {
        Self {
            voice_name: voice_name.into(),
            tone_instruction: tone_instruction.into(),
            details,
        }
    }

    pub fn voice_name(&self) -> &str {
        &self.voice_name
    }

    pub fn tone_instruction(&self) -> &str {
        &self.tone_instruction
    }

    pub fn details(&self) -> VoiceDetails {
        self.details
    }
}

impl From<VoicePreset> for VoiceProfile {
    fn from(preset: VoicePreset) -> Self {
        Self::new(
            preset.voice_name(),
            preset.tone_instruction(),
            preset.details(),
        )
    }
}

impl Default for VoiceProfile {
    fn default() -> Self {
        VoicePreset::default().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_all_presets() {
        assert_eq!(
            "Notebook-Clean".parse::<VoicePreset>().unwrap(),
            VoicePreset::NotebookClean
        );
        assert_eq!(
            "reflective".parse::<VoicePreset>().unwrap(),
            VoicePreset::Reflective
        );
        assert_eq!("CREATIVE".parse::<VoicePreset>().unwrap(), VoicePreset::Creative);
        assert_eq!(
            "analytical".parse::<VoicePreset>().unwrap(),
            VoicePreset::Analytical
        );
        assert_eq!("Gentle".parse::<VoicePreset>().unwrap(), VoicePreset::Gentle);
    }

    #[test]
    fn parse_loose_spelling() {
        assert_eq!(
            "notebook_clean".parse::<VoicePreset>().unwrap(),
            VoicePreset::NotebookClean
        );
        assert_eq!(
            "  notebook clean ".parse::<VoicePreset>().unwrap(),
            VoicePreset::NotebookClean
        );
    }

    #[test]
    fn parse_invalid() {
        assert!("loud".parse::<VoicePreset>().is_err());
        assert!("".parse::<VoicePreset>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for preset in ALL_PRESETS {
            assert_eq!(preset.to_string().parse::<VoicePreset>().unwrap(), *preset);
        }
    }

    #[test]
    fn voice_names() {
        assert_eq!(VoicePreset::NotebookClean.voice_name(), "Kore");
        assert_eq!(VoicePreset::Reflective.voice_name(), "Fenrir");
        assert_eq!(VoicePreset::Creative.voice_name(), "Puck");
        assert_eq!(VoicePreset::Analytical.voice_name(), "Charon");
        assert_eq!(VoicePreset::Gentle.voice_name(), "Zephyr");
    }

    #[test]
    fn details_in_range() {
        for preset in ALL_PRESETS {
            assert!(preset.details().is_valid(), "{} out of range", preset);
            assert!(!preset.tone_instruction().is_empty());
            assert!(!preset.description().is_empty());
        }
    }

    #[test]
    fn details_validation() {
        assert!(!VoiceDetails::new(1.2, 0.0, 0.0, 0.0, 0.0, 0.0).is_valid());
        assert!(!VoiceDetails::new(0.0, 0.0, 0.0, 0.0, 0.0, -0.1).is_valid());
    }

    #[test]
    fn profile_from_preset() {
        let profile = VoiceProfile::from(VoicePreset::Gentle);
        assert_eq!(profile.voice_name(), "Zephyr");
        assert!(profile.tone_instruction().contains("soothing"));
        assert_eq!(profile.details().warmth, 0.9);
    }

    #[test]
    fn serde_uses_display_names() {
        let json = serde_json::to_string(&VoicePreset::NotebookClean).unwrap();
        assert_eq!(json, "\"Notebook-Clean\"");
        let parsed: VoicePreset = serde_json::from_str("\"Analytical\"").unwrap();
        assert_eq!(parsed, VoicePreset::Analytical);
    }

    #[test]
    fn default_is_notebook_clean() {
        assert_eq!(VoicePreset::default(), VoicePreset::NotebookClean);
        assert_eq!(VoiceProfile::default().voice_name(), "Kore");
    }
}
