//! PCM sample conversion
//!
//! Pure functions shared by the capture and playback paths. Nothing here
//! touches a device or a socket.

/// Sample rate the live service expects for microphone audio
pub const INPUT_SAMPLE_RATE: u32 = 16_000;

/// Sample rate of the live service's reply audio
pub const OUTPUT_SAMPLE_RATE: u32 = 24_000;

/// Number of mono samples per capture frame
pub const CAPTURE_FRAME_SIZE: usize = 4096;

/// Root-mean-square loudness of a frame. Empty frames are silent.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

/// Resample with linear interpolation.
///
/// Output sample `i` is taken at fractional source position
/// `i * source_rate / target_rate`, blending the two neighbouring source
/// samples. Equal rates return a copy of the input.
pub fn resample_linear(source: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate || source.is_empty() {
        return source.to_vec();
    }

    let ratio = source_rate as f64 / target_rate as f64;
    let output_len = (source.len() as f64 / ratio).round() as usize;
    let last = source.len() - 1;

    (0..output_len)
        .map(|i| {
            let position = i as f64 * ratio;
            let index = (position.floor() as usize).min(last);
            let weight = (position - index as f64) as f32;
            let current = source[index];
            let next = source[(index + 1).min(last)];
            current * (1.0 - weight) + next * weight
        })
        .collect()
}

/// Quantize float samples to signed 16-bit.
///
/// Samples are clipped to [-1, 1] first; +1.0 saturates at `i16::MAX`.
pub fn float_to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| {
            let clipped = s.clamp(-1.0, 1.0);
            (clipped * 32768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
        })
        .collect()
}

/// Convert signed 16-bit samples to floats in [-1, 1)
pub fn i16_to_float(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / 32768.0).collect()
}

/// Serialize samples as little-endian bytes
pub fn i16_to_le_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Parse little-endian bytes into samples. The caller checks the length is even.
pub fn le_bytes_to_i16(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Mix interleaved multi-channel samples down to mono
pub fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels as usize)
        .map(|chunk| chunk.iter().sum::<f32>() / chunk.len() as f32)
        .collect()
}
