//! Live conversation service adapters

mod gemini_live;

pub use gemini_live::GeminiLiveService;
