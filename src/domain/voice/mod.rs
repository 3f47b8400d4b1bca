//! Voice personality domain module

mod preset;
mod system_instruction;

pub use preset::{VoiceDetails, VoicePreset, VoiceProfile, ALL_PRESETS};
pub use system_instruction::SystemInstruction;
