//! Microphone capture port

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("No audio input device available")]
    NoAudioDevice,

    #[error("Microphone access denied: {0}")]
    PermissionDenied(String),

    #[error("Failed to start capture: {0}")]
    StartFailed(String),

    #[error("Capture is already running")]
    AlreadyCapturing,
}

/// One block of mono samples at the device's native rate
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureFrame {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl CaptureFrame {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }
}

/// Port for continuous microphone capture
#[async_trait]
pub trait AudioCapture: Send + Sync {
    /// Acquire the input device and start delivering frames.
    ///
    /// Frames are offered with `try_send`; when the receiver lags, frames
    /// are dropped rather than blocking the device callback.
    async fn start(&self, frames: mpsc::Sender<CaptureFrame>) -> Result<(), CaptureError>;

    /// Release the device. Safe to call when not capturing.
    async fn stop(&self);

    /// Check if the device is currently held
    fn is_capturing(&self) -> bool;
}
