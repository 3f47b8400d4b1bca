//! Live conversation service port
//!
//! A connected session is exposed as a pair of channels plus the worker
//! tasks that pump them, so the controller never touches the socket.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::domain::audio::PcmChunk;
use crate::domain::memory::FunctionDeclaration;

/// Live service errors
#[derive(Debug, Clone, Error)]
pub enum LiveError {
    #[error("Failed to connect to live service: {0}")]
    Connect(String),

    #[error("Live session setup failed: {0}")]
    Setup(String),

    #[error("Failed to send to live service: {0}")]
    Transmit(String),

    #[error("Failed to receive from live service: {0}")]
    Receive(String),

    #[error("Live service closed the connection: {0}")]
    Closed(String),
}

/// Remote voice activity detection settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityDetection {
    /// Detect speech onset eagerly
    pub high_start_sensitivity: bool,
    /// Leave turn-taking to the remote service
    pub automatic: bool,
}

impl Default for ActivityDetection {
    fn default() -> Self {
        Self {
            high_start_sensitivity: true,
            automatic: true,
        }
    }
}

/// Everything needed to open a live session
#[derive(Debug, Clone)]
pub struct LiveSetup {
    pub api_key: String,
    pub model: String,
    pub voice_name: String,
    pub system_instruction: String,
    pub tools: Vec<FunctionDeclaration>,
    pub activity: ActivityDetection,
}

/// A function call requested by the model
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub id: String,
    pub name: String,
    pub args: Value,
}

/// The result of one function call, keyed by the call's id and name
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResponse {
    pub id: String,
    pub name: String,
    pub response: Value,
}

/// Messages sent to the live service
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Audio(PcmChunk),
    ToolResponses(Vec<ToolResponse>),
}

/// Events received from the live service
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    Audio(PcmChunk),
    ToolCall(Vec<FunctionCall>),
    Transcript { text: String, is_user: bool },
    TurnComplete,
}

/// Background tasks that own the connection
#[derive(Debug, Default)]
pub struct LiveWorkers {
    tasks: Vec<JoinHandle<()>>,
    close: Option<oneshot::Sender<()>>,
}

impl LiveWorkers {
    /// `close` asks the writer to send a close frame and finish
    pub fn new(tasks: Vec<JoinHandle<()>>, close: oneshot::Sender<()>) -> Self {
        Self {
            tasks,
            close: Some(close),
        }
    }

    /// Request a graceful close, wait up to `grace`, then abort stragglers
    pub async fn shutdown(mut self, grace: Duration) {
        if let Some(close) = self.close.take() {
            let _ = close.send(());
        }

        let deadline = tokio::time::Instant::now() + grace;
        for task in self.tasks.iter_mut() {
            if tokio::time::timeout_at(deadline, &mut *task).await.is_err() {
                task.abort();
            }
        }
    }
}

/// An open live session
#[derive(Debug)]
pub struct LiveChannel {
    pub outbound: mpsc::Sender<ClientMessage>,
    /// Yields an error once and then ends when the connection fails or closes
    pub inbound: mpsc::Receiver<Result<ServerEvent, LiveError>>,
    pub workers: LiveWorkers,
}

/// Port for the bidirectional live conversation service
#[async_trait]
pub trait LiveService: Send + Sync {
    /// Connect and complete session setup
    async fn connect(&self, setup: LiveSetup) -> Result<LiveChannel, LiveError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_signals_close_and_joins() {
        let (close_tx, close_rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let _ = close_rx.await;
        });
        let workers = LiveWorkers::new(vec![task], close_tx);
        tokio::time::timeout(Duration::from_secs(1), workers.shutdown(Duration::from_millis(500)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn shutdown_aborts_stuck_tasks() {
        let (close_tx, _close_rx) = oneshot::channel();
        let task = tokio::spawn(std::future::pending::<()>());
        let workers = LiveWorkers::new(vec![task], close_tx);
        tokio::time::timeout(Duration::from_secs(1), workers.shutdown(Duration::from_millis(20)))
            .await
            .unwrap();
    }
}
