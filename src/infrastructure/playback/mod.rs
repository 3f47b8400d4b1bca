//! Audio playback infrastructure module

mod rodio_output;

pub use rodio_output::RodioOutput;
