//! Audio pipeline: capture frames to wire chunks, wire chunks to scheduled playback

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::application::ports::{AudioOutput, CaptureFrame, OutputError};
use crate::domain::audio::pcm::{resample_linear, rms};
use crate::domain::audio::{PcmChunk, PlaybackSchedule, INPUT_SAMPLE_RATE};
use crate::domain::error::DecodeError;

/// A capture frame ready to transmit
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFrame {
    /// RMS loudness of the raw frame
    pub level: f32,
    pub chunk: PcmChunk,
}

/// Measure, resample to the input rate, and encode one capture frame.
///
/// Returns `None` for empty frames.
pub fn encode_capture_frame(frame: &CaptureFrame) -> Option<EncodedFrame> {
    if frame.samples.is_empty() {
        return None;
    }

    let level = rms(&frame.samples);
    let resampled = resample_linear(&frame.samples, frame.sample_rate, INPUT_SAMPLE_RATE);
    if resampled.is_empty() {
        return None;
    }

    Some(EncodedFrame {
        level,
        chunk: PcmChunk::encode(&resampled, INPUT_SAMPLE_RATE),
    })
}

/// Playback path errors
#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Decodes reply chunks and chains them on the output clock
pub struct PlaybackPath<O: AudioOutput + ?Sized> {
    output: Arc<O>,
    schedule: PlaybackSchedule,
}

impl<O: AudioOutput + ?Sized> PlaybackPath<O> {
    pub fn new(output: Arc<O>) -> Self {
        Self {
            output,
            schedule: PlaybackSchedule::new(),
        }
    }

    /// Decode and enqueue a chunk.
    ///
    /// # Returns
    /// The start time the chunk was scheduled at. Undecodable chunks leave
    /// the watermark untouched.
    pub fn play(&mut self, chunk: &PcmChunk) -> Result<Duration, PlaybackError> {
        let audio = chunk.decode()?;
        let now = self.output.clock();
        let mut schedule = self.schedule;
        let start = schedule.schedule(now, audio.duration());
        self.output.enqueue(audio, start)?;
        self.schedule = schedule;
        Ok(start)
    }

    /// Time until everything scheduled has played
    pub fn remaining(&self) -> Duration {
        self.schedule.remaining(self.output.clock())
    }

    pub fn is_drained(&self) -> bool {
        self.schedule.is_drained(self.output.clock())
    }

    pub fn watermark(&self) -> Duration {
        self.schedule.watermark()
    }
}
