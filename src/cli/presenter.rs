//! CLI presenter for output formatting

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::memory::{Idea, Link, RecallHit};
use crate::domain::session::SessionState;
use crate::domain::voice::VoicePreset;

/// Width of the microphone level meter
const METER_WIDTH: usize = 12;

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
    is_spinner_active: Arc<AtomicBool>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self {
            spinner: None,
            is_spinner_active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            spinner.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
        self.is_spinner_active.store(true, Ordering::SeqCst);
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
        self.is_spinner_active.store(false, Ordering::SeqCst);
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
        self.is_spinner_active.store(false, Ordering::SeqCst);
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
        self.is_spinner_active.store(false, Ordering::SeqCst);
    }

    /// Print a line above the spinner, or to stderr when none is running
    fn line(&self, text: &str) {
        match self.spinner {
            Some(ref spinner) if self.is_spinner_active.load(Ordering::SeqCst) => {
                spinner.println(text)
            }
            _ => eprintln!("{}", text),
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        self.line(&format!("{} {}", "ℹ".cyan(), message));
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        self.line(&format!("{} {}", "✓".green(), message));
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        self.line(&format!("{} {}", "⚠".yellow(), message));
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        self.line(&format!("{} {}", "✗".red(), message));
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a key-value pair (for config and settings listings)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Format a microphone level in [0, 1] as a meter
    pub fn format_level(&self, level: f32) -> String {
        let level = if level.is_finite() {
            level.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let filled = (level * METER_WIDTH as f32).round() as usize;
        let empty = METER_WIDTH - filled;

        format!("[{}{}]", "█".repeat(filled).cyan(), "░".repeat(empty))
    }

    /// Show the session state and microphone level on the spinner line
    pub fn session_status(&self, state: SessionState, level: f32) {
        let label = match state {
            SessionState::Listening => "Listening".green(),
            SessionState::Speaking => "Speaking".cyan(),
            SessionState::Processing => "Thinking".yellow(),
            SessionState::Idle => "Idle".dimmed(),
        };
        self.update_spinner(&format!("{} {}", label, self.format_level(level)));
    }

    /// Print one finished transcript line
    pub fn transcript(&self, is_user: bool, text: &str) {
        let speaker = if is_user {
            format!("{:>5}:", "you").bold()
        } else {
            format!("{:>5}:", "voice").magenta().bold()
        };
        self.line(&format!("{} {}", speaker, text.trim()));
    }

    /// Print one idea in a listing
    pub fn idea(&self, idea: &Idea) {
        let mut header = format!(
            "{} {}  {}",
            "●".cyan(),
            idea.title.bold(),
            idea.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
        );
        if !idea.tags.is_empty() {
            let tags: Vec<String> = idea.tags.iter().map(|t| format!("#{}", t)).collect();
            header.push_str(&format!("  {}", tags.join(" ").yellow()));
        }
        println!("{}", header);
        if !idea.summary.is_empty() {
            println!("  {}", idea.summary);
        }
        println!("  {}", idea.id.to_string().dimmed());
    }

    /// Print one timeline row under its relative day
    pub fn timeline_entry(&self, when: &str, idea: &Idea) {
        println!(
            "{} {}  {}",
            format!("{:<12}", when).dimmed(),
            "●".cyan(),
            idea.title.bold()
        );
        if !idea.summary.is_empty() {
            println!("{:<14}{}", "", idea.summary);
        }
    }

    /// Print one recall result
    pub fn recall_hit(&self, hit: &RecallHit) {
        println!("{} {}", "●".cyan(), hit.title.bold());
        if !hit.summary.is_empty() {
            println!("  {}", hit.summary);
        }
    }

    /// Print one link, using idea titles where known
    pub fn link(&self, link: &Link, source: Option<&str>, target: Option<&str>) {
        let source = source.map(str::to_string).unwrap_or_else(|| link.source_idea_id.to_string());
        let target = target.map(str::to_string).unwrap_or_else(|| link.target_idea_id.to_string());
        println!(
            "{} {} {} ({:.1}, {})",
            source.bold(),
            "→".cyan(),
            target.bold(),
            link.strength,
            link.rationale.dimmed()
        );
    }

    /// Print one voice preset
    pub fn preset(&self, preset: VoicePreset) {
        println!(
            "{} {}",
            format!("{:<15}", preset.as_str()).cyan(),
            format!("voice: {}", preset.voice_name()).dimmed()
        );
        println!("  {}", preset.description());
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Joins streamed transcription fragments into whole lines per speaker
#[derive(Debug, Default)]
pub struct TranscriptBuffer {
    speaker: Option<bool>,
    text: String,
}

impl TranscriptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fragment. Returns the previous speaker's line when the speaker changes.
    pub fn push(&mut self, text: &str, is_user: bool) -> Option<(bool, String)> {
        let finished = match self.speaker {
            Some(speaker) if speaker != is_user => self.flush(),
            _ => None,
        };
        self.speaker = Some(is_user);
        self.text.push_str(text);
        finished
    }

    /// Take the pending line, if it has any content
    pub fn flush(&mut self) -> Option<(bool, String)> {
        let speaker = self.speaker.take()?;
        let text = std::mem::take(&mut self.text);
        if text.trim().is_empty() {
            None
        } else {
            Some((speaker, text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_level_silent() {
        colored::control::set_override(false);
        let presenter = Presenter::new();
        assert_eq!(presenter.format_level(0.0), format!("[{}]", "░".repeat(METER_WIDTH)));
    }

    #[test]
    fn format_level_full_and_out_of_range() {
        colored::control::set_override(false);
        let presenter = Presenter::new();
        let full = format!("[{}]", "█".repeat(METER_WIDTH));
        assert_eq!(presenter.format_level(1.0), full);
        assert_eq!(presenter.format_level(7.5), full);
        assert_eq!(presenter.format_level(f32::NAN), presenter.format_level(0.0));
    }

    #[test]
    fn format_level_half() {
        colored::control::set_override(false);
        let presenter = Presenter::new();
        let half = presenter.format_level(0.5);
        assert_eq!(half.matches('█').count(), METER_WIDTH / 2);
    }

    #[test]
    fn transcript_buffer_joins_same_speaker() {
        let mut buffer = TranscriptBuffer::new();
        assert_eq!(buffer.push("Save an ", true), None);
        assert_eq!(buffer.push("idea", true), None);
        assert_eq!(buffer.flush(), Some((true, "Save an idea".to_string())));
        assert_eq!(buffer.flush(), None);
    }

    #[test]
    fn transcript_buffer_emits_on_speaker_change() {
        let mut buffer = TranscriptBuffer::new();
        buffer.push("hello", true);
        assert_eq!(buffer.push("Hi", false), Some((true, "hello".to_string())));
        assert_eq!(buffer.flush(), Some((false, "Hi".to_string())));
    }

    #[test]
    fn transcript_buffer_skips_blank_lines() {
        let mut buffer = TranscriptBuffer::new();
        buffer.push("  ", true);
        assert_eq!(buffer.push("Hi", false), None);
    }
}
