//! System instruction value object

use super::preset::VoiceProfile;

/// Fixed behavioural instruction for every session
const BASE_INSTRUCTION: &str = r#"You are the user's second brain.
Your job is to structure their thinking, not replace it.
You listen first.
You reflect, summarize, and connect ideas.
You do not overwhelm.
You surface connections only when helpful.
You answer conversationally, with context and memory.
You are interruptible.
You stop when done.
Default to short, punchy responses unless asked to expand.
If the user asks to "Save" or implies a thought is finished, acknowledge it briefly."#;

/// The complete system instruction sent when a session opens.
/// Combines the base instruction with the profile's tone modifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInstruction {
    content: String,
}

impl SystemInstruction {
    /// Build the instruction for a voice profile
    pub fn build(profile: &VoiceProfile) -> Self {
        let content = format!(
            "{}\n\nTone Instruction: {}",
            BASE_INSTRUCTION,
            profile.tone_instruction()
        );
        Self { content }
    }

    /// Get the instruction text
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Consume and return the content
    pub fn into_content(self) -> String {
        self.content
    }
}

impl Default for SystemInstruction {
    fn default() -> Self {
        Self::build(&VoiceProfile::default())
    }
}
