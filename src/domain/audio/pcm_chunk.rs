//! PCM chunk value object
//!
//! The serialization boundary between float samples and the live service's
//! wire format: 16-bit signed little-endian PCM, base64-encoded, tagged with
//! an `audio/pcm;rate=<N>` descriptor.

use std::fmt;
use std::time::Duration;

use base64::Engine;

use super::pcm::{float_to_i16, i16_to_float, i16_to_le_bytes, le_bytes_to_i16};
use crate::domain::error::DecodeError;

const MIME_PREFIX: &str = "audio/pcm";

/// Value object for one base64-encoded PCM16 chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmChunk {
    data: String,
    sample_rate: u32,
}

impl PcmChunk {
    /// Wrap already-encoded base64 data
    pub fn new(data: impl Into<String>, sample_rate: u32) -> Self {
        Self {
            data: data.into(),
            sample_rate,
        }
    }

    /// Quantize and encode float samples
    pub fn encode(samples: &[f32], sample_rate: u32) -> Self {
        let bytes = i16_to_le_bytes(&float_to_i16(samples));
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            sample_rate,
        }
    }

    /// Build a chunk from a MIME descriptor, falling back to `default_rate`
    /// when the descriptor carries no usable rate.
    pub fn from_mime(data: impl Into<String>, mime_type: &str, default_rate: u32) -> Self {
        let rate = parse_rate(mime_type).unwrap_or(default_rate);
        Self::new(data, rate)
    }

    /// Decode into float samples
    pub fn decode(&self) -> Result<DecodedAudio, DecodeError> {
        if self.data.is_empty() {
            return Err(DecodeError::Empty);
        }

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| DecodeError::InvalidBase64(e.to_string()))?;

        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        if bytes.len() % 2 != 0 {
            return Err(DecodeError::OddLength(bytes.len()));
        }

        Ok(DecodedAudio::new(
            i16_to_float(&le_bytes_to_i16(&bytes)),
            self.sample_rate,
        ))
    }

    /// Base64 payload
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// MIME-style descriptor, e.g. `audio/pcm;rate=16000`
    pub fn mime_type(&self) -> String {
        format!("{};rate={}", MIME_PREFIX, self.sample_rate)
    }
}

impl fmt::Display for PcmChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} base64 chars)", self.mime_type(), self.data.len())
    }
}

/// Extract the `rate=` parameter from an `audio/pcm` descriptor
fn parse_rate(mime_type: &str) -> Option<u32> {
    let mut parts = mime_type.split(';').map(str::trim);
    if !parts.next()?.eq_ignore_ascii_case(MIME_PREFIX) {
        return None;
    }
    parts
        .filter_map(|p| p.strip_prefix("rate="))
        .find_map(|r| r.parse().ok())
        .filter(|&r| r > 0)
}

/// Decoded mono float samples ready for playback
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl DecodedAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback length
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let nanos = self.samples.len() as u64 * 1_000_000_000 / self.sample_rate as u64;
        Duration::from_nanos(nanos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_type_carries_rate() {
        let chunk = PcmChunk::encode(&[0.0; 4], 16_000);
        assert_eq!(chunk.mime_type(), "audio/pcm;rate=16000");
    }

    #[test]
    fn encode_produces_little_endian_base64() {
        // 0.5 -> 16384 -> [0x00, 0x40]
        let chunk = PcmChunk::encode(&[0.5], 16_000);
        assert_eq!(chunk.data(), "AEA=");
    }

    #[test]
    fn decode_divides_by_32768() {
        // [0x00, 0x40, 0x00, 0xC0] -> [16384, -16384]
        let chunk = PcmChunk::new("AEAAwA==", 24_000);
        let audio = chunk.decode().unwrap();
        assert_eq!(audio.samples(), &[0.5, -0.5]);
        assert_eq!(audio.sample_rate(), 24_000);
    }

    #[test]
    fn decode_empty_fails() {
        assert_eq!(PcmChunk::new("", 24_000).decode(), Err(DecodeError::Empty));
    }

    #[test]
    fn decode_odd_length_fails() {
        // Three bytes
        let err = PcmChunk::new("AAAA", 24_000).decode().unwrap_err();
        assert_eq!(err, DecodeError::OddLength(3));
    }

    #[test]
    fn decode_garbage_fails() {
        let err = PcmChunk::new("not base64!", 24_000).decode().unwrap_err();
        assert!(matches!(err, DecodeError::InvalidBase64(_)));
    }

    #[test]
    fn from_mime_reads_rate() {
        let chunk = PcmChunk::from_mime("AAAA", "audio/pcm;rate=24000", 16_000);
        assert_eq!(chunk.sample_rate(), 24_000);

        let chunk = PcmChunk::from_mime("AAAA", "audio/pcm; rate=22050", 16_000);
        assert_eq!(chunk.sample_rate(), 22_050);
    }

    #[test]
    fn from_mime_falls_back_to_default() {
        assert_eq!(
            PcmChunk::from_mime("AAAA", "audio/pcm", 24_000).sample_rate(),
            24_000
        );
        assert_eq!(
            PcmChunk::from_mime("AAAA", "audio/ogg;rate=8000", 24_000).sample_rate(),
            24_000
        );
        assert_eq!(
            PcmChunk::from_mime("AAAA", "audio/pcm;rate=0", 24_000).sample_rate(),
            24_000
        );
    }

    #[test]
    fn decoded_duration() {
        let audio = DecodedAudio::new(vec![0.0; 2400], 24_000);
        assert_eq!(audio.duration(), Duration::from_millis(100));
        assert_eq!(DecodedAudio::new(vec![], 24_000).duration(), Duration::ZERO);
    }

    #[test]
    fn encode_then_decode_keeps_sample_count() {
        let samples: Vec<f32> = (0..480).map(|i| (i as f32 / 48.0).sin() * 0.8).collect();
        let decoded = PcmChunk::encode(&samples, 24_000).decode().unwrap();
        assert_eq!(decoded.samples().len(), samples.len());
    }
}
