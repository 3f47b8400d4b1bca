//! Gemini Live API adapter (BidiGenerateContent over websocket)

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::application::ports::{
    ClientMessage, FunctionCall, LiveChannel, LiveError, LiveService, LiveSetup, LiveWorkers,
    ServerEvent,
};
use crate::domain::audio::{PcmChunk, OUTPUT_SAMPLE_RATE};
use crate::domain::memory::FunctionDeclaration;

/// Gemini Live websocket endpoint
const LIVE_ENDPOINT: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// How long to wait for `setupComplete`
const SETUP_TIMEOUT: Duration = Duration::from_secs(15);

/// Messages buffered in each direction
const CHANNEL_CAPACITY: usize = 64;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;
type EventSender = mpsc::Sender<Result<ServerEvent, LiveError>>;

// Client messages

#[derive(Debug, Serialize)]
struct SetupMessage<'a> {
    setup: Setup<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Setup<'a> {
    model: String,
    generation_config: GenerationConfig<'a>,
    system_instruction: Content<'a>,
    tools: Vec<Tool<'a>>,
    input_audio_transcription: Empty,
    output_audio_transcription: Empty,
    realtime_input_config: RealtimeInputConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_modalities: [&'static str; 1],
    speech_config: SpeechConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig<'a> {
    voice_config: VoiceConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig<'a> {
    prebuilt_voice_config: PrebuiltVoiceConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig<'a> {
    voice_name: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [TextPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool<'a> {
    function_declarations: &'a [FunctionDeclaration],
}

#[derive(Debug, Serialize)]
struct Empty {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RealtimeInputConfig {
    automatic_activity_detection: AutomaticActivityDetection,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AutomaticActivityDetection {
    disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_of_speech_sensitivity: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RealtimeInputMessage<'a> {
    realtime_input: RealtimeInput<'a>,
}

#[derive(Debug, Serialize)]
struct RealtimeInput<'a> {
    audio: Blob<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob<'a> {
    mime_type: String,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolResponseMessage<'a> {
    tool_response: ToolResponsePayload<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolResponsePayload<'a> {
    function_responses: Vec<FunctionResponse<'a>>,
}

#[derive(Debug, Serialize)]
struct FunctionResponse<'a> {
    id: &'a str,
    name: &'a str,
    response: &'a Value,
}

// Server messages

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerMessage {
    setup_complete: Option<Value>,
    server_content: Option<ServerContent>,
    tool_call: Option<ToolCall>,
    go_away: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerContent {
    model_turn: Option<ModelTurn>,
    input_transcription: Option<Transcription>,
    output_transcription: Option<Transcription>,
    #[serde(default)]
    turn_complete: bool,
}

#[derive(Debug, Deserialize)]
struct ModelTurn {
    #[serde(default)]
    parts: Vec<ServerPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerPart {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct Transcription {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolCall {
    #[serde(default)]
    function_calls: Vec<WireFunctionCall>,
}

#[derive(Debug, Deserialize)]
struct WireFunctionCall {
    #[serde(default)]
    id: String,
    name: String,
    #[serde(default)]
    args: Value,
}

impl ServerMessage {
    /// Flatten into port events, in wire order
    fn into_events(self) -> Vec<ServerEvent> {
        let mut events = Vec::new();

        if let Some(content) = self.server_content {
            if let Some(turn) = content.model_turn {
                for part in turn.parts {
                    if let Some(blob) = part.inline_data {
                        if blob.mime_type.is_empty() || blob.mime_type.starts_with("audio/") {
                            events.push(ServerEvent::Audio(PcmChunk::from_mime(
                                blob.data,
                                &blob.mime_type,
                                OUTPUT_SAMPLE_RATE,
                            )));
                        }
                    }
                }
            }
            for (transcription, is_user) in [
                (content.input_transcription, true),
                (content.output_transcription, false),
            ] {
                if let Some(text) = transcription.and_then(|t| t.text) {
                    if !text.is_empty() {
                        events.push(ServerEvent::Transcript { text, is_user });
                    }
                }
            }
            if content.turn_complete {
                events.push(ServerEvent::TurnComplete);
            }
        }

        if let Some(call) = self.tool_call {
            let calls: Vec<FunctionCall> = call
                .function_calls
                .into_iter()
                .map(|fc| FunctionCall {
                    id: fc.id,
                    name: fc.name,
                    args: fc.args,
                })
                .collect();
            if !calls.is_empty() {
                events.push(ServerEvent::ToolCall(calls));
            }
        }

        events
    }
}

/// Serialize the session setup message
fn encode_setup(setup: &LiveSetup) -> Result<String, serde_json::Error> {
    let model = if setup.model.starts_with("models/") {
        setup.model.clone()
    } else {
        format!("models/{}", setup.model)
    };

    let message = SetupMessage {
        setup: Setup {
            model,
            generation_config: GenerationConfig {
                response_modalities: ["AUDIO"],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: &setup.voice_name,
                        },
                    },
                },
            },
            system_instruction: Content {
                parts: [TextPart {
                    text: &setup.system_instruction,
                }],
            },
            tools: vec![Tool {
                function_declarations: &setup.tools,
            }],
            input_audio_transcription: Empty {},
            output_audio_transcription: Empty {},
            realtime_input_config: RealtimeInputConfig {
                automatic_activity_detection: AutomaticActivityDetection {
                    disabled: !setup.activity.automatic,
                    start_of_speech_sensitivity: setup.activity.automatic.then_some(
                        if setup.activity.high_start_sensitivity {
                            "START_SENSITIVITY_HIGH"
                        } else {
                            "START_SENSITIVITY_LOW"
                        },
                    ),
                },
            },
        },
    };

    serde_json::to_string(&message)
}

/// Serialize one outbound message
fn encode_client_message(message: &ClientMessage) -> Result<String, serde_json::Error> {
    match message {
        ClientMessage::Audio(chunk) => serde_json::to_string(&RealtimeInputMessage {
            realtime_input: RealtimeInput {
                audio: Blob {
                    mime_type: chunk.mime_type(),
                    data: chunk.data(),
                },
            },
        }),
        ClientMessage::ToolResponses(responses) => serde_json::to_string(&ToolResponseMessage {
            tool_response: ToolResponsePayload {
                function_responses: responses
                    .iter()
                    .map(|r| FunctionResponse {
                        id: &r.id,
                        name: &r.name,
                        response: &r.response,
                    })
                    .collect(),
            },
        }),
    }
}

/// Extract the JSON text of a frame. Gemini sends JSON in both text and binary frames.
fn frame_text(message: Message) -> Option<String> {
    match message {
        Message::Text(text) => Some(text),
        Message::Binary(bytes) => String::from_utf8(bytes).ok(),
        _ => None,
    }
}

fn close_reason(message: &Message) -> Option<String> {
    match message {
        Message::Close(Some(frame)) if !frame.reason.is_empty() => Some(frame.reason.to_string()),
        Message::Close(_) => Some("closed without reason".to_string()),
        _ => None,
    }
}

/// Gemini Live service
pub struct GeminiLiveService {
    endpoint: String,
}

impl GeminiLiveService {
    /// Create a service for the public Gemini endpoint
    pub fn new() -> Self {
        Self {
            endpoint: LIVE_ENDPOINT.to_string(),
        }
    }

    /// Create a service for a custom endpoint
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    fn url(&self, api_key: &str) -> String {
        format!("{}?key={}", self.endpoint, api_key)
    }
}

impl Default for GeminiLiveService {
    fn default() -> Self {
        Self::new()
    }
}

/// Read frames until the server acknowledges setup
async fn await_setup_complete(source: &mut WsSource) -> Result<(), LiveError> {
    while let Some(frame) = source.next().await {
        let frame = frame.map_err(|e| LiveError::Setup(e.to_string()))?;
        if let Some(reason) = close_reason(&frame) {
            return Err(LiveError::Setup(reason));
        }
        let Some(text) = frame_text(frame) else {
            continue;
        };
        match serde_json::from_str::<ServerMessage>(&text) {
            Ok(message) if message.setup_complete.is_some() => return Ok(()),
            Ok(_) => debug!("Ignoring message before setupComplete"),
            Err(e) => warn!("Invalid JSON during setup: {}", e),
        }
    }
    Err(LiveError::Setup("connection closed during setup".to_string()))
}

/// Pump outbound messages into the socket until closed
async fn run_writer(
    mut sink: WsSink,
    mut outbound: mpsc::Receiver<ClientMessage>,
    mut close: oneshot::Receiver<()>,
    events: EventSender,
) {
    loop {
        tokio::select! {
            _ = &mut close => break,
            message = outbound.recv() => {
                let Some(message) = message else {
                    break;
                };
                let text = match encode_client_message(&message) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Failed to encode outbound message: {}", e);
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(text)).await {
                    let _ = events.send(Err(LiveError::Transmit(e.to_string()))).await;
                    return;
                }
            }
        }
    }

    debug!("Sending close frame");
    let _ = sink.send(Message::Close(None)).await;
}

/// Forward server messages as events until the connection ends
async fn run_reader(mut source: WsSource, events: EventSender) {
    let error = loop {
        let frame = match source.next().await {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => break LiveError::Receive(e.to_string()),
            None => break LiveError::Closed("stream ended".to_string()),
        };

        if let Some(reason) = close_reason(&frame) {
            info!("Gemini Live closed connection: {}", reason);
            break LiveError::Closed(reason);
        }

        let Some(text) = frame_text(frame) else {
            continue;
        };

        let message: ServerMessage = match serde_json::from_str(&text) {
            Ok(message) => message,
            Err(e) => {
                let preview: String = text.chars().take(100).collect();
                warn!("Invalid JSON from Gemini Live: {} ({})", e, preview);
                continue;
            }
        };

        if message.go_away.is_some() {
            break LiveError::Closed("server requested disconnect".to_string());
        }

        for event in message.into_events() {
            if events.send(Ok(event)).await.is_err() {
                return;
            }
        }
    };

    let _ = events.send(Err(error)).await;
}

#[async_trait]
impl LiveService for GeminiLiveService {
    async fn connect(&self, setup: LiveSetup) -> Result<LiveChannel, LiveError> {
        info!(model = %setup.model, voice = %setup.voice_name, "Connecting to Gemini Live");

        let (stream, _) = tokio_tungstenite::connect_async(self.url(&setup.api_key))
            .await
            .map_err(|e| LiveError::Connect(e.to_string()))?;
        let (mut sink, mut source) = stream.split();

        let setup_text = encode_setup(&setup).map_err(|e| LiveError::Setup(e.to_string()))?;
        sink.send(Message::Text(setup_text))
            .await
            .map_err(|e| LiveError::Setup(e.to_string()))?;

        tokio::time::timeout(SETUP_TIMEOUT, await_setup_complete(&mut source))
            .await
            .map_err(|_| LiveError::Setup("timed out waiting for setupComplete".to_string()))??;
        info!("Gemini Live session ready");

        let (outbound_tx, outbound_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (events_tx, events_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (close_tx, close_rx) = oneshot::channel();

        let writer = tokio::spawn(run_writer(sink, outbound_rx, close_rx, events_tx.clone()));
        let reader = tokio::spawn(run_reader(source, events_tx));

        Ok(LiveChannel {
            outbound: outbound_tx,
            inbound: events_rx,
            workers: LiveWorkers::new(vec![writer, reader], close_tx),
        })
    }
}
