//! Rodio-based speaker output
//!
//! `OutputStream` is not `Send`, so the stream and its sink live on a
//! playback thread driven by a command channel. The device clock is wall
//! time since `open`; the sink plays appended buffers back-to-back, and
//! silence is inserted whenever a buffer is scheduled past the end of the
//! queue.

use std::sync::mpsc as std_mpsc;
use std::sync::Mutex as StdMutex;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use rodio::buffer::SamplesBuffer;
use rodio::source::{Source, Zero};
use rodio::{OutputStream, Sink, StreamError};
use tracing::{debug, warn};

use crate::application::ports::{AudioOutput, OutputError};
use crate::domain::audio::DecodedAudio;

enum Command {
    Play {
        audio: DecodedAudio,
        lead_in: Duration,
    },
    Halt,
}

/// An open output device
struct Playback {
    commands: std_mpsc::Sender<Command>,
    opened_at: Instant,
    queued_end: Duration,
    thread: JoinHandle<()>,
}

/// Speaker output using rodio
pub struct RodioOutput {
    playback: StdMutex<Option<Playback>>,
}

impl RodioOutput {
    /// Create a closed output
    pub fn new() -> Self {
        Self {
            playback: StdMutex::new(None),
        }
    }

    fn with_playback<T>(&self, f: impl FnOnce(&mut Option<Playback>) -> T) -> T {
        match self.playback.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

impl Default for RodioOutput {
    fn default() -> Self {
        Self::new()
    }
}

/// Own the stream and sink until halted or the command channel closes
fn run_playback(
    commands: std_mpsc::Receiver<Command>,
    ready: std_mpsc::SyncSender<Result<(), OutputError>>,
) {
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(StreamError::NoDevice) => {
            let _ = ready.send(Err(OutputError::NoAudioDevice));
            return;
        }
        Err(e) => {
            let _ = ready.send(Err(OutputError::OpenFailed(e.to_string())));
            return;
        }
    };
    let sink = match Sink::try_new(&handle) {
        Ok(sink) => sink,
        Err(e) => {
            let _ = ready.send(Err(OutputError::OpenFailed(e.to_string())));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    for command in commands {
        match command {
            Command::Play { audio, lead_in } => {
                let sample_rate = audio.sample_rate();
                if !lead_in.is_zero() {
                    sink.append(Zero::<f32>::new(1, sample_rate).take_duration(lead_in));
                }
                sink.append(SamplesBuffer::new(1, sample_rate, audio.into_samples()));
            }
            Command::Halt => break,
        }
    }

    sink.stop();
    debug!("Speaker released");
}

impl AudioOutput for RodioOutput {
    fn open(&self) -> Result<(), OutputError> {
        self.halt();

        let (commands_tx, commands_rx) = std_mpsc::channel();
        let (ready_tx, ready_rx) = std_mpsc::sync_channel(1);
        let thread = std::thread::spawn(move || run_playback(commands_rx, ready_tx));

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => return Err(OutputError::OpenFailed("Playback thread exited".into())),
        }

        self.with_playback(|slot| {
            *slot = Some(Playback {
                commands: commands_tx,
                opened_at: Instant::now(),
                queued_end: Duration::ZERO,
                thread,
            });
        });
        Ok(())
    }

    fn clock(&self) -> Duration {
        self.with_playback(|slot| {
            slot.as_ref()
                .map(|p| p.opened_at.elapsed())
                .unwrap_or(Duration::ZERO)
        })
    }

    fn enqueue(&self, audio: DecodedAudio, start_at: Duration) -> Result<(), OutputError> {
        self.with_playback(|slot| {
            let playback = slot.as_mut().ok_or(OutputError::NotOpen)?;

            let now = playback.opened_at.elapsed();
            let lead_in = start_at.saturating_sub(now.max(playback.queued_end));
            playback.queued_end = start_at + audio.duration();

            playback
                .commands
                .send(Command::Play { audio, lead_in })
                .map_err(|_| {
                    warn!("Playback thread is gone");
                    OutputError::NotOpen
                })
        })
    }

    fn halt(&self) {
        let Some(playback) = self.with_playback(Option::take) else {
            return;
        };
        let _ = playback.commands.send(Command::Halt);
        let _ = playback.thread.join();
    }
}

impl Drop for RodioOutput {
    fn drop(&mut self) {
        self.halt();
    }
}
