//! Conversation session state machine

use std::fmt;
use thiserror::Error;

/// Conversation states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Listening,
    Speaking,
    Processing,
}

impl SessionState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Speaking => "speaking",
            Self::Processing => "processing",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything that can move the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    /// Devices acquired and the live connection is up
    Opened,
    /// A reply audio chunk was scheduled for playback
    ReplyAudio,
    /// The live service asked for a tool call
    ToolCall,
    /// Playback reached the watermark with nothing further pending
    PlaybackDrained,
    /// The session was closed locally
    Closed,
    /// The live connection failed or was closed remotely
    ConnectionLost,
}

impl SessionEvent {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Opened => "open",
            Self::ReplyAudio => "receive reply audio",
            Self::ToolCall => "handle tool call",
            Self::PlaybackDrained => "drain playback",
            Self::Closed => "close",
            Self::ConnectionLost => "lose connection",
        }
    }
}

/// Error when an event is not valid in the current state
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {} while in {current_state} state", .event.as_str())]
pub struct InvalidStateTransition {
    pub current_state: SessionState,
    pub event: SessionEvent,
}

/// Result of applying an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: SessionState,
    pub to: SessionState,
}

impl Transition {
    /// Whether the state actually changed
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Session state machine.
///
/// Transition table:
///   IDLE -> LISTENING (opened)
///   LISTENING | SPEAKING | PROCESSING -> SPEAKING (reply audio)
///   LISTENING | SPEAKING | PROCESSING -> PROCESSING (tool call)
///   SPEAKING -> LISTENING (playback drained)
///   LISTENING | PROCESSING -> unchanged (playback drained)
///   any -> IDLE (closed, connection lost)
#[derive(Debug, Default)]
pub struct SessionMachine {
    state: SessionState,
}

impl SessionMachine {
    /// Create a new machine in idle state
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    /// Get the current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if idle
    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    /// Target state for `event`, or an error if the event is not valid now
    pub fn next(
        state: SessionState,
        event: SessionEvent,
    ) -> Result<SessionState, InvalidStateTransition> {
        use SessionEvent as E;
        use SessionState as S;

        let next = match (state, event) {
            (S::Idle, E::Opened) => S::Listening,
            (S::Listening | S::Speaking | S::Processing, E::ReplyAudio) => S::Speaking,
            (S::Listening | S::Speaking | S::Processing, E::ToolCall) => S::Processing,
            (S::Speaking, E::PlaybackDrained) => S::Listening,
            (S::Listening | S::Processing, E::PlaybackDrained) => state,
            (_, E::Closed | E::ConnectionLost) => S::Idle,
            _ => {
                return Err(InvalidStateTransition {
                    current_state: state,
                    event,
                })
            }
        };
        Ok(next)
    }

    /// Apply an event. The only place the state is mutated.
    pub fn apply(&mut self, event: SessionEvent) -> Result<Transition, InvalidStateTransition> {
        let from = self.state;
        let to = Self::next(from, event)?;
        self.state = to;
        Ok(Transition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listening() -> SessionMachine {
        let mut machine = SessionMachine::new();
        machine.apply(SessionEvent::Opened).unwrap();
        machine
    }

    #[test]
    fn new_machine_is_idle() {
        let machine = SessionMachine::new();
        assert!(machine.is_idle());
        assert_eq!(machine.state(), SessionState::Idle);
    }

    #[test]
    fn open_from_idle() {
        let mut machine = SessionMachine::new();
        let transition = machine.apply(SessionEvent::Opened).unwrap();
        assert_eq!(transition.from, SessionState::Idle);
        assert_eq!(transition.to, SessionState::Listening);
        assert!(transition.changed());
    }

    #[test]
    fn open_while_listening_fails() {
        let mut machine = listening();
        let err = machine.apply(SessionEvent::Opened).unwrap_err();
        assert_eq!(err.current_state, SessionState::Listening);
        assert_eq!(machine.state(), SessionState::Listening);
    }

    #[test]
    fn reply_audio_moves_to_speaking() {
        let mut machine = listening();
        machine.apply(SessionEvent::ReplyAudio).unwrap();
        assert_eq!(machine.state(), SessionState::Speaking);

        // Already speaking stays speaking
        let transition = machine.apply(SessionEvent::ReplyAudio).unwrap();
        assert!(!transition.changed());
    }

    #[test]
    fn reply_audio_while_idle_fails() {
        let mut machine = SessionMachine::new();
        let err = machine.apply(SessionEvent::ReplyAudio).unwrap_err();
        assert_eq!(err.current_state, SessionState::Idle);
        assert!(machine.is_idle());
    }

    #[test]
    fn tool_call_moves_to_processing() {
        let mut machine = listening();
        machine.apply(SessionEvent::ReplyAudio).unwrap();
        machine.apply(SessionEvent::ToolCall).unwrap();
        assert_eq!(machine.state(), SessionState::Processing);
    }

    #[test]
    fn tool_call_while_idle_fails() {
        let mut machine = SessionMachine::new();
        assert!(machine.apply(SessionEvent::ToolCall).is_err());
    }

    #[test]
    fn drain_only_leaves_speaking() {
        let mut machine = listening();
        machine.apply(SessionEvent::ReplyAudio).unwrap();
        machine.apply(SessionEvent::PlaybackDrained).unwrap();
        assert_eq!(machine.state(), SessionState::Listening);

        machine.apply(SessionEvent::ToolCall).unwrap();
        let transition = machine.apply(SessionEvent::PlaybackDrained).unwrap();
        assert!(!transition.changed());
        assert_eq!(machine.state(), SessionState::Processing);
    }

    #[test]
    fn drain_while_idle_fails() {
        let mut machine = SessionMachine::new();
        assert!(machine.apply(SessionEvent::PlaybackDrained).is_err());
    }

    #[test]
    fn processing_leaves_on_reply_audio() {
        let mut machine = listening();
        machine.apply(SessionEvent::ToolCall).unwrap();
        machine.apply(SessionEvent::ReplyAudio).unwrap();
        assert_eq!(machine.state(), SessionState::Speaking);
    }

    #[test]
    fn close_from_any_state() {
        for event in [
            None,
            Some(SessionEvent::ReplyAudio),
            Some(SessionEvent::ToolCall),
        ] {
            let mut machine = listening();
            if let Some(event) = event {
                machine.apply(event).unwrap();
            }
            machine.apply(SessionEvent::Closed).unwrap();
            assert!(machine.is_idle());
        }

        // Closing an idle machine is allowed and changes nothing
        let mut machine = SessionMachine::new();
        let transition = machine.apply(SessionEvent::Closed).unwrap();
        assert!(!transition.changed());
    }

    #[test]
    fn connection_lost_forces_idle() {
        let mut machine = listening();
        machine.apply(SessionEvent::ToolCall).unwrap();
        machine.apply(SessionEvent::ConnectionLost).unwrap();
        assert!(machine.is_idle());
    }

    #[test]
    fn full_cycle_is_reentrant() {
        let mut machine = listening();
        machine.apply(SessionEvent::ReplyAudio).unwrap();
        machine.apply(SessionEvent::PlaybackDrained).unwrap();
        machine.apply(SessionEvent::Closed).unwrap();
        assert!(machine.is_idle());

        // Can open again
        machine.apply(SessionEvent::Opened).unwrap();
        assert_eq!(machine.state(), SessionState::Listening);
    }

    #[test]
    fn state_display() {
        assert_eq!(SessionState::Idle.to_string(), "idle");
        assert_eq!(SessionState::Listening.to_string(), "listening");
        assert_eq!(SessionState::Speaking.to_string(), "speaking");
        assert_eq!(SessionState::Processing.to_string(), "processing");
    }

    #[test]
    fn error_display() {
        let err = InvalidStateTransition {
            current_state: SessionState::Idle,
            event: SessionEvent::ReplyAudio,
        };
        let msg = err.to_string();
        assert!(msg.contains("receive reply audio"));
        assert!(msg.contains("idle"));
    }
}
