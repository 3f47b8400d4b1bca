//! Session domain module

mod state;

pub use state::{InvalidStateTransition, SessionEvent, SessionMachine, SessionState, Transition};
