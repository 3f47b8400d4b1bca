//! Speaker output port

use std::time::Duration;

use thiserror::Error;

use crate::domain::audio::DecodedAudio;

/// Playback errors
#[derive(Debug, Clone, Error)]
pub enum OutputError {
    #[error("No audio output device available")]
    NoAudioDevice,

    #[error("Failed to open audio output: {0}")]
    OpenFailed(String),

    #[error("Audio output is not open")]
    NotOpen,
}

/// Port for scheduled playback on an output device.
///
/// Methods are synchronous. `clock` and `enqueue` are called from the
/// session's receive task and must not block. `open` and `halt` may wait
/// for the device to start or stop; the session runs them on the blocking pool.
pub trait AudioOutput: Send + Sync {
    /// Open the device and reset the clock to zero
    fn open(&self) -> Result<(), OutputError>;

    /// Time elapsed on the device clock since `open`
    fn clock(&self) -> Duration;

    /// Queue a buffer to start at `start_at` on the device clock
    fn enqueue(&self, audio: DecodedAudio, start_at: Duration) -> Result<(), OutputError>;

    /// Drop everything queued and release the device. Idempotent.
    fn halt(&self);
}
