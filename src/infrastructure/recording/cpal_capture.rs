//! Cross-platform microphone capture using cpal
//!
//! The cpal stream is not `Send`, so it lives on a dedicated thread that
//! holds it until capture is stopped. The device callback downmixes to mono,
//! cuts fixed-size frames, and offers them to the session without blocking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::thread::JoinHandle;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::application::ports::{AudioCapture, CaptureError, CaptureFrame};
use crate::domain::audio::pcm::downmix_to_mono;
use crate::domain::audio::{CAPTURE_FRAME_SIZE, INPUT_SAMPLE_RATE};

/// How often the capture thread checks for a stop request
const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(50);

/// Cuts a continuous mono stream into fixed-size frames
struct FrameAssembler {
    pending: Vec<f32>,
    frame_size: usize,
    sample_rate: u32,
    frames: mpsc::Sender<CaptureFrame>,
    dropped: u64,
}

impl FrameAssembler {
    fn new(frame_size: usize, sample_rate: u32, frames: mpsc::Sender<CaptureFrame>) -> Self {
        Self {
            pending: Vec::with_capacity(frame_size * 2),
            frame_size,
            sample_rate,
            frames,
            dropped: 0,
        }
    }

    /// Append samples and emit every complete frame
    fn push(&mut self, mono: &[f32]) {
        self.pending.extend_from_slice(mono);
        while self.pending.len() >= self.frame_size {
            let samples: Vec<f32> = self.pending.drain(..self.frame_size).collect();
            if self
                .frames
                .try_send(CaptureFrame::new(samples, self.sample_rate))
                .is_err()
            {
                self.dropped += 1;
                if self.dropped.is_power_of_two() {
                    debug!(dropped = self.dropped, "Capture consumer lagging, dropping frames");
                }
            }
        }
    }
}

/// Microphone capture using cpal
pub struct CpalCapture {
    capturing: Arc<AtomicBool>,
    worker: StdMutex<Option<JoinHandle<()>>>,
}

impl CpalCapture {
    /// Create a new cpal-based capture
    pub fn new() -> Self {
        Self {
            capturing: Arc::new(AtomicBool::new(false)),
            worker: StdMutex::new(None),
        }
    }

    /// Get the default input device
    fn get_input_device() -> Result<cpal::Device, CaptureError> {
        let host = cpal::default_host();
        host.default_input_device()
            .ok_or(CaptureError::NoAudioDevice)
    }

    /// Get a suitable input configuration
    fn get_input_config(
        device: &cpal::Device,
    ) -> Result<(StreamConfig, SampleFormat), CaptureError> {
        let supported_configs = device
            .supported_input_configs()
            .map_err(|e| classify(format!("Failed to get configs: {}", e)))?;

        // Prefer mono, and configs that include the input rate so no
        // resampling is needed
        let mut best_config: Option<cpal::SupportedStreamConfigRange> = None;

        for config in supported_configs {
            if config.sample_format() != SampleFormat::I16
                && config.sample_format() != SampleFormat::F32
            {
                continue;
            }

            let includes_target = config.min_sample_rate().0 <= INPUT_SAMPLE_RATE
                && config.max_sample_rate().0 >= INPUT_SAMPLE_RATE;

            let is_better = match &best_config {
                None => true,
                Some(current) => {
                    let fewer_channels = config.channels() < current.channels();
                    let current_includes = current.min_sample_rate().0 <= INPUT_SAMPLE_RATE
                        && current.max_sample_rate().0 >= INPUT_SAMPLE_RATE;
                    fewer_channels || (includes_target && !current_includes)
                }
            };
            if is_better {
                best_config = Some(config);
            }
        }

        let config_range = best_config.ok_or(CaptureError::StartFailed(
            "No suitable input config found".into(),
        ))?;

        let sample_rate = if config_range.min_sample_rate().0 <= INPUT_SAMPLE_RATE
            && config_range.max_sample_rate().0 >= INPUT_SAMPLE_RATE
        {
            SampleRate(INPUT_SAMPLE_RATE)
        } else {
            config_range.max_sample_rate()
        };

        let sample_format = config_range.sample_format();
        let config = StreamConfig {
            channels: config_range.channels(),
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        Ok((config, sample_format))
    }

    /// Open the device and start the stream. Runs on the capture thread.
    fn open_stream(frames: mpsc::Sender<CaptureFrame>) -> Result<cpal::Stream, CaptureError> {
        let device = Self::get_input_device()?;
        let (config, sample_format) = Self::get_input_config(&device)?;
        let sample_rate = config.sample_rate.0;
        let channels = config.channels;

        info!(
            device = %device.name().unwrap_or_else(|_| "unknown".to_string()),
            sample_rate,
            channels,
            "Opening microphone"
        );

        let on_error = |err: cpal::StreamError| warn!("Audio input stream error: {}", err);

        let stream = match sample_format {
            SampleFormat::I16 => {
                let mut assembler = FrameAssembler::new(CAPTURE_FRAME_SIZE, sample_rate, frames);
                device.build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        let floats: Vec<f32> = data.iter().map(|&s| s as f32 / 32768.0).collect();
                        assembler.push(&downmix_to_mono(&floats, channels));
                    },
                    on_error,
                    None,
                )
            }
            SampleFormat::F32 => {
                let mut assembler = FrameAssembler::new(CAPTURE_FRAME_SIZE, sample_rate, frames);
                device.build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        assembler.push(&downmix_to_mono(data, channels));
                    },
                    on_error,
                    None,
                )
            }
            _ => {
                return Err(CaptureError::StartFailed(
                    "Unsupported sample format".into(),
                ))
            }
        }
        .map_err(|e| match e {
            cpal::BuildStreamError::DeviceNotAvailable => CaptureError::NoAudioDevice,
            other => classify(other.to_string()),
        })?;

        stream.play().map_err(|e| match e {
            cpal::PlayStreamError::DeviceNotAvailable => CaptureError::NoAudioDevice,
            other => classify(other.to_string()),
        })?;

        Ok(stream)
    }

    fn join_worker(&self) -> Option<JoinHandle<()>> {
        match self.worker.lock() {
            Ok(mut worker) => worker.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

impl Default for CpalCapture {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a backend message to the most specific capture error
fn classify(message: String) -> CaptureError {
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("not authorized")
    {
        CaptureError::PermissionDenied(message)
    } else {
        CaptureError::StartFailed(message)
    }
}

#[async_trait]
impl AudioCapture for CpalCapture {
    async fn start(&self, frames: mpsc::Sender<CaptureFrame>) -> Result<(), CaptureError> {
        if self.capturing.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::AlreadyCapturing);
        }

        let (ready_tx, ready_rx) = oneshot::channel();
        let capturing = Arc::clone(&self.capturing);

        let handle = std::thread::spawn(move || {
            let stream = match Self::open_stream(frames) {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    stream
                }
                Err(e) => {
                    capturing.store(false, Ordering::SeqCst);
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            while capturing.load(Ordering::SeqCst) {
                std::thread::sleep(POLL_INTERVAL);
            }

            drop(stream);
            debug!("Microphone released");
        });

        match ready_rx.await {
            Ok(Ok(())) => {
                if let Ok(mut worker) = self.worker.lock() {
                    *worker = Some(handle);
                }
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                self.capturing.store(false, Ordering::SeqCst);
                Err(CaptureError::StartFailed("Capture thread exited".into()))
            }
        }
    }

    async fn stop(&self) {
        self.capturing.store(false, Ordering::SeqCst);

        if let Some(handle) = self.join_worker() {
            let _ = tokio::task::spawn_blocking(move || handle.join()).await;
        }
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }
}
