//! Live session use case
//!
//! Owns one conversation at a time: microphone capture streaming out,
//! reply audio and tool calls streaming in, and the state machine that
//! tracks who is talking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::dispatcher::ToolDispatcher;
use super::pipeline::{encode_capture_frame, PlaybackPath};
use super::ports::{
    ActivityDetection, AudioCapture, AudioOutput, CaptureError, CaptureFrame, ClientMessage,
    IdeaStore, LiveError, LiveService, LiveSetup, LiveWorkers, OutputError, ServerEvent,
};
use crate::domain::memory::tool_declarations;
use crate::domain::session::{SessionEvent, SessionMachine, SessionState};
use crate::domain::voice::{SystemInstruction, VoiceProfile};

/// Capture frames buffered between the device thread and the capture task
const FRAME_BUFFER: usize = 32;

/// How long `close` waits for the connection to shut down cleanly
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Errors from the session use case
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("Microphone unavailable: {0}")]
    Device(#[from] CaptureError),

    #[error("Speaker unavailable: {0}")]
    Output(#[from] OutputError),

    #[error("Connection error: {0}")]
    Connection(#[from] LiveError),
}

pub type StateCallback = Arc<dyn Fn(SessionState) + Send + Sync>;
pub type TranscriptCallback = Arc<dyn Fn(&str, bool) + Send + Sync>;
pub type LevelCallback = Arc<dyn Fn(f32) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(&SessionError) + Send + Sync>;

/// Observers for session activity. Invoked from background tasks.
#[derive(Clone, Default)]
pub struct SessionCallbacks {
    /// Called after every state change
    pub on_state_change: Option<StateCallback>,
    /// Called with (text, is_user) for each transcription fragment
    pub on_transcript: Option<TranscriptCallback>,
    /// Called with the RMS level of each capture frame
    pub on_audio_level: Option<LevelCallback>,
    /// Called when the connection fails mid-session
    pub on_error: Option<ErrorCallback>,
}

/// Connection settings shared by every session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub api_key: String,
    pub model: String,
    pub activity: ActivityDetection,
}

/// State machine plus the observer for its transitions
#[derive(Clone)]
struct StateCell {
    machine: Arc<StdMutex<SessionMachine>>,
}

impl StateCell {
    fn new() -> Self {
        Self {
            machine: Arc::new(StdMutex::new(SessionMachine::new())),
        }
    }

    fn get(&self) -> SessionState {
        match self.machine.lock() {
            Ok(m) => m.state(),
            Err(poisoned) => poisoned.into_inner().state(),
        }
    }

    fn apply(&self, event: SessionEvent, callbacks: &SessionCallbacks) {
        let result = match self.machine.lock() {
            Ok(mut m) => m.apply(event),
            Err(poisoned) => poisoned.into_inner().apply(event),
        };

        match result {
            Ok(transition) if transition.changed() => {
                debug!(from = %transition.from, to = %transition.to, "Session state changed");
                if let Some(ref cb) = callbacks.on_state_change {
                    cb(transition.to);
                }
            }
            Ok(_) => {}
            Err(e) => debug!("Ignoring event: {}", e),
        }
    }
}

/// An open session's handles
struct Session {
    generation: u64,
    profile: VoiceProfile,
    callbacks: SessionCallbacks,
    capture_task: JoinHandle<()>,
    receive_task: JoinHandle<()>,
    workers: LiveWorkers,
}

/// What the background tasks share with the controller
struct TaskContext<C, O, S: IdeaStore> {
    capture: Arc<C>,
    output: Arc<O>,
    dispatcher: Arc<ToolDispatcher<S>>,
    state: StateCell,
    callbacks: SessionCallbacks,
}

/// Live session use case
pub struct SessionController<C, O, L, S>
where
    C: AudioCapture + 'static,
    O: AudioOutput + 'static,
    L: LiveService,
    S: IdeaStore + 'static,
{
    capture: Arc<C>,
    output: Arc<O>,
    live: L,
    dispatcher: Arc<ToolDispatcher<S>>,
    config: SessionConfig,
    state: StateCell,
    session: Arc<Mutex<Option<Session>>>,
    generation: AtomicU64,
}

impl<C, O, L, S> SessionController<C, O, L, S>
where
    C: AudioCapture + 'static,
    O: AudioOutput + 'static,
    L: LiveService,
    S: IdeaStore + 'static,
{
    /// Create a new session controller
    pub fn new(capture: C, output: O, live: L, store: Arc<S>, config: SessionConfig) -> Self {
        Self {
            capture: Arc::new(capture),
            output: Arc::new(output),
            live,
            dispatcher: Arc::new(ToolDispatcher::new(store)),
            config,
            state: StateCell::new(),
            session: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
        }
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Voice profile of the active session, if any.
    ///
    /// `None` once the session is closed or its connection is lost.
    pub async fn profile(&self) -> Option<VoiceProfile> {
        self.session.lock().await.as_ref().map(|s| s.profile.clone())
    }

    /// Open a session, closing any active one first.
    ///
    /// Everything acquired before a failure is released before returning.
    pub async fn open(
        &self,
        profile: VoiceProfile,
        callbacks: SessionCallbacks,
    ) -> Result<(), SessionError> {
        let mut slot = self.session.lock().await;
        self.shutdown(&mut slot).await;

        let (frames_tx, frames_rx) = mpsc::channel::<CaptureFrame>(FRAME_BUFFER);
        self.capture.start(frames_tx).await?;

        if let Err(e) = open_output(&self.output).await {
            self.capture.stop().await;
            return Err(e.into());
        }

        let setup = LiveSetup {
            api_key: self.config.api_key.clone(),
            model: self.config.model.clone(),
            voice_name: profile.voice_name().to_string(),
            system_instruction: SystemInstruction::build(&profile).into_content(),
            tools: tool_declarations(),
            activity: self.config.activity,
        };

        let channel = match self.live.connect(setup).await {
            Ok(channel) => channel,
            Err(e) => {
                self.capture.stop().await;
                halt_output(&self.output).await;
                return Err(e.into());
            }
        };

        self.state.apply(SessionEvent::Opened, &callbacks);
        info!(voice = %profile.voice_name(), "Live session opened");

        let context = Arc::new(TaskContext {
            capture: self.capture.clone(),
            output: self.output.clone(),
            dispatcher: self.dispatcher.clone(),
            state: self.state.clone(),
            callbacks: callbacks.clone(),
        });

        let capture_task = tokio::spawn(run_capture(
            context.clone(),
            frames_rx,
            channel.outbound.clone(),
        ));
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let receive_task = tokio::spawn(run_receive(
            context,
            channel.inbound,
            channel.outbound,
            Lease {
                slot: self.session.clone(),
                generation,
            },
        ));

        *slot = Some(Session {
            generation,
            profile,
            callbacks,
            capture_task,
            receive_task,
            workers: channel.workers,
        });

        Ok(())
    }

    /// Close the active session. A no-op when idle.
    pub async fn close(&self) {
        let mut slot = self.session.lock().await;
        self.shutdown(&mut slot).await;
    }

    async fn shutdown(&self, slot: &mut Option<Session>) {
        let Some(session) = slot.take() else {
            return;
        };

        session.capture_task.abort();
        session.receive_task.abort();
        let _ = session.capture_task.await;
        let _ = session.receive_task.await;

        self.capture.stop().await;
        halt_output(&self.output).await;
        session.workers.shutdown(CLOSE_GRACE).await;

        self.state.apply(SessionEvent::Closed, &session.callbacks);
        info!("Live session closed");
    }
}

/// Starting and stopping the device may wait on its playback thread
async fn open_output<O: AudioOutput + 'static>(output: &Arc<O>) -> Result<(), OutputError> {
    let output = output.clone();
    tokio::task::spawn_blocking(move || output.open())
        .await
        .unwrap_or_else(|e| Err(OutputError::OpenFailed(e.to_string())))
}

async fn halt_output<O: AudioOutput + 'static>(output: &Arc<O>) {
    let output = output.clone();
    if let Err(e) = tokio::task::spawn_blocking(move || output.halt()).await {
        warn!(error = %e, "Audio output halt did not finish");
    }
}

/// The receive task's claim on the session slot it was started for
struct Lease {
    slot: Arc<Mutex<Option<Session>>>,
    generation: u64,
}

impl Lease {
    /// Drop a session whose connection is gone, unless it was already replaced
    async fn release(self) {
        let mut slot = self.slot.lock().await;
        if slot.as_ref().map(|s| s.generation) != Some(self.generation) {
            return;
        }
        let Some(session) = slot.take() else {
            return;
        };
        drop(slot);

        // The receive task is the caller, so its own handle is only detached
        session.capture_task.abort();
        let _ = session.capture_task.await;
        session.workers.shutdown(CLOSE_GRACE).await;
        debug!("Released lost session");
    }
}

/// Stream capture frames to the live service until either side stops
async fn run_capture<C, O, S>(
    context: Arc<TaskContext<C, O, S>>,
    mut frames: mpsc::Receiver<CaptureFrame>,
    outbound: mpsc::Sender<ClientMessage>,
) where
    C: AudioCapture,
    O: AudioOutput,
    S: IdeaStore,
{
    while let Some(frame) = frames.recv().await {
        let Some(encoded) = encode_capture_frame(&frame) else {
            continue;
        };

        if let Some(ref cb) = context.callbacks.on_audio_level {
            cb(encoded.level);
        }

        if outbound.send(ClientMessage::Audio(encoded.chunk)).await.is_err() {
            debug!("Outbound channel closed, stopping capture stream");
            break;
        }
    }
}

/// Handle inbound events and playback drain until the connection ends
async fn run_receive<C, O, S>(
    context: Arc<TaskContext<C, O, S>>,
    mut inbound: mpsc::Receiver<Result<ServerEvent, LiveError>>,
    outbound: mpsc::Sender<ClientMessage>,
    lease: Lease,
) where
    C: AudioCapture,
    O: AudioOutput + 'static,
    S: IdeaStore,
{
    let mut playback = PlaybackPath::new(context.output.clone());

    let error = loop {
        let speaking = context.state.get() == SessionState::Speaking;
        let wait = playback.remaining();

        tokio::select! {
            biased;

            event = inbound.recv() => match event {
                Some(Ok(event)) => {
                    if let Err(e) = handle_event(&context, &mut playback, &outbound, event).await {
                        break e;
                    }
                }
                Some(Err(e)) => break e,
                None => break LiveError::Closed("connection ended".to_string()),
            },

            _ = tokio::time::sleep(wait), if speaking => {
                if playback.is_drained() {
                    context.state.apply(SessionEvent::PlaybackDrained, &context.callbacks);
                }
            }
        }
    };

    warn!(error = %error, "Live connection lost");
    context.capture.stop().await;
    halt_output(&context.output).await;
    context
        .state
        .apply(SessionEvent::ConnectionLost, &context.callbacks);

    if let Some(ref cb) = context.callbacks.on_error {
        cb(&SessionError::Connection(error));
    }

    lease.release().await;
}

async fn handle_event<C, O, S>(
    context: &TaskContext<C, O, S>,
    playback: &mut PlaybackPath<O>,
    outbound: &mpsc::Sender<ClientMessage>,
    event: ServerEvent,
) -> Result<(), LiveError>
where
    C: AudioCapture,
    O: AudioOutput,
    S: IdeaStore,
{
    match event {
        ServerEvent::Audio(chunk) => match playback.play(&chunk) {
            Ok(start) => {
                debug!(%chunk, start_ms = start.as_millis() as u64, "Scheduled reply audio");
                context
                    .state
                    .apply(SessionEvent::ReplyAudio, &context.callbacks);
            }
            Err(e) => warn!(error = %e, "Dropping reply audio chunk"),
        },

        ServerEvent::ToolCall(calls) => {
            context.state.apply(SessionEvent::ToolCall, &context.callbacks);
            let responses = context.dispatcher.dispatch_all(&calls).await;
            outbound
                .send(ClientMessage::ToolResponses(responses))
                .await
                .map_err(|_| LiveError::Transmit("outbound channel closed".to_string()))?;
        }

        ServerEvent::Transcript { text, is_user } => {
            if let Some(ref cb) = context.callbacks.on_transcript {
                cb(&text, is_user);
            }
        }

        ServerEvent::TurnComplete => debug!("Model turn complete"),
    }

    Ok(())
}
