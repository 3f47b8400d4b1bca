//! Audio domain module

pub mod pcm;
mod pcm_chunk;
mod schedule;

pub use pcm::{CAPTURE_FRAME_SIZE, INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE};
pub use pcm_chunk::{DecodedAudio, PcmChunk};
pub use schedule::PlaybackSchedule;
