//! Live session runner and configuration plumbing

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::application::ports::{ActivityDetection, ConfigStore, IdeaStore};
use crate::application::{SessionCallbacks, SessionConfig, SessionController, SessionError};
use crate::domain::config::{AppConfig, UserSettings};
use crate::domain::session::SessionState;
use crate::domain::voice::VoicePreset;
use crate::infrastructure::{
    default_data_dir, CpalCapture, GeminiLiveService, JsonFileStore, RodioOutput, XdgConfigStore,
};

use super::presenter::{Presenter, TranscriptBuffer};
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Session callbacks, forwarded to the terminal loop
#[derive(Debug, Clone, PartialEq)]
enum UiEvent {
    State(SessionState),
    Transcript { text: String, is_user: bool },
    Level(f32),
    Error(String),
}

fn ui_callbacks(tx: mpsc::UnboundedSender<UiEvent>) -> SessionCallbacks {
    let state_tx = tx.clone();
    let transcript_tx = tx.clone();
    let level_tx = tx.clone();
    let error_tx = tx;

    SessionCallbacks {
        on_state_change: Some(Arc::new(move |state: SessionState| {
            let _ = state_tx.send(UiEvent::State(state));
        })),
        on_transcript: Some(Arc::new(move |text: &str, is_user: bool| {
            let _ = transcript_tx.send(UiEvent::Transcript {
                text: text.to_string(),
                is_user,
            });
        })),
        on_audio_level: Some(Arc::new(move |level: f32| {
            let _ = level_tx.send(UiEvent::Level(level));
        })),
        on_error: Some(Arc::new(move |e: &SessionError| {
            let _ = error_tx.send(UiEvent::Error(e.to_string()));
        })),
    }
}

/// Require an API key before any device is touched
pub fn require_api_key(config: &AppConfig) -> Result<String, String> {
    config
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            format!(
                "Missing API key. Set {} environment variable or run 'second-voice config set api_key <key>'",
                API_KEY_ENV
            )
        })
}

/// Idea store at the configured data directory
pub fn open_store(config: &AppConfig) -> JsonFileStore {
    let dir = config.data_dir_or(default_data_dir);
    debug!(dir = %dir.display(), "Using data directory");
    JsonFileStore::new(dir)
}

/// Connection settings for a session from config and saved preferences
pub fn session_config(api_key: String, config: &AppConfig, settings: &UserSettings) -> SessionConfig {
    SessionConfig {
        api_key,
        model: config.model_or_default().to_string(),
        activity: ActivityDetection {
            high_start_sensitivity: settings.high_start_sensitivity(),
            automatic: settings.auto_end_turn,
        },
    }
}

/// Run a live session until a shutdown signal or the connection ends
pub async fn run_session(config: AppConfig, voice: Option<VoicePreset>) -> ExitCode {
    let mut presenter = Presenter::new();

    let api_key = match require_api_key(&config) {
        Ok(key) => key,
        Err(e) => {
            presenter.error(&e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut shutdown = match ShutdownSignal::install() {
        Ok(signal) => signal,
        Err(e) => {
            presenter.error(&format!("Failed to setup signal handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let store = Arc::new(open_store(&config));
    let settings = match store.settings().await {
        Ok(settings) => settings,
        Err(e) => {
            presenter.warn(&format!("Using default settings: {}", e));
            UserSettings::default()
        }
    };
    let preset = voice.unwrap_or(settings.voice_preset);

    let controller = SessionController::new(
        CpalCapture::new(),
        RodioOutput::new(),
        GeminiLiveService::new(),
        store,
        session_config(api_key, &config, &settings),
    );

    let (ui_tx, mut ui_rx) = mpsc::unbounded_channel();

    presenter.start_spinner(&format!("Connecting ({} voice)...", preset));
    if let Err(e) = controller.open(preset.into(), ui_callbacks(ui_tx)).await {
        presenter.spinner_fail("Could not start session");
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }
    presenter.spinner_success(&format!("Connected with the {} voice", preset));
    presenter.info("Speak freely. Press Ctrl+C to end the session.");
    presenter.start_spinner("Listening");

    let mut state = controller.state();
    let mut level = 0.0;
    let mut transcript = TranscriptBuffer::new();

    let exit = loop {
        tokio::select! {
            reason = shutdown.recv() => {
                if let Some(reason) = reason {
                    info!(%reason, "Ending session");
                }
                break EXIT_SUCCESS;
            }
            event = ui_rx.recv() => match event {
                Some(UiEvent::State(next)) => {
                    if next == SessionState::Listening {
                        if let Some((is_user, line)) = transcript.flush() {
                            presenter.transcript(is_user, &line);
                        }
                    }
                    state = next;
                    presenter.session_status(state, level);
                }
                Some(UiEvent::Transcript { text, is_user }) => {
                    if let Some((speaker, line)) = transcript.push(&text, is_user) {
                        presenter.transcript(speaker, &line);
                    }
                }
                Some(UiEvent::Level(next)) => {
                    level = next;
                    presenter.session_status(state, level);
                }
                Some(UiEvent::Error(message)) => {
                    warn!(error = %message, "Session ended");
                    presenter.error(&message);
                    break EXIT_ERROR;
                }
                None => break EXIT_SUCCESS,
            }
        }
    };

    if let Some((is_user, line)) = transcript.flush() {
        presenter.transcript(is_user, &line);
    }
    controller.close().await;

    if exit == EXIT_SUCCESS {
        presenter.spinner_success("Session closed");
    } else {
        presenter.spinner_fail("Session lost");
    }
    ExitCode::from(exit)
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load().await.unwrap_or_else(|e| {
        warn!(error = %e, "Ignoring unreadable config file");
        AppConfig::empty()
    });

    let env_config = AppConfig {
        api_key: env::var(API_KEY_ENV).ok().filter(|s| !s.is_empty()),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::LiveError;
    use std::path::PathBuf;

    #[test]
    fn missing_api_key_is_reported() {
        let err = require_api_key(&AppConfig::defaults()).unwrap_err();
        assert!(err.contains(API_KEY_ENV));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let config = AppConfig {
            api_key: Some("  ".into()),
            ..AppConfig::defaults()
        };
        assert!(require_api_key(&config).is_err());
    }

    #[test]
    fn session_config_follows_settings() {
        let config = AppConfig {
            model: Some("custom-model".into()),
            ..AppConfig::defaults()
        };
        let settings = UserSettings {
            vad_sensitivity: 0.2,
            auto_end_turn: false,
            ..Default::default()
        };

        let session = session_config("key".into(), &config, &settings);
        assert_eq!(session.model, "custom-model");
        assert!(!session.activity.high_start_sensitivity);
        assert!(!session.activity.automatic);
    }

    #[test]
    fn store_uses_configured_data_dir() {
        let config = AppConfig {
            data_dir: Some(PathBuf::from("/tmp/second-voice-test")),
            ..AppConfig::defaults()
        };
        assert_eq!(open_store(&config).dir(), PathBuf::from("/tmp/second-voice-test"));
    }

    #[test]
    fn callbacks_forward_to_ui_channel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let callbacks = ui_callbacks(tx);

        if let Some(cb) = callbacks.on_state_change.as_ref() {
            cb(SessionState::Speaking);
        }
        if let Some(cb) = callbacks.on_transcript.as_ref() {
            cb("hello", true);
        }
        if let Some(cb) = callbacks.on_error.as_ref() {
            cb(&SessionError::Connection(LiveError::Closed("bye".into())));
        }

        assert_eq!(rx.try_recv().unwrap(), UiEvent::State(SessionState::Speaking));
        assert_eq!(
            rx.try_recv().unwrap(),
            UiEvent::Transcript {
                text: "hello".into(),
                is_user: true
            }
        );
        assert!(matches!(rx.try_recv().unwrap(), UiEvent::Error(m) if m.contains("bye")));
    }
}
