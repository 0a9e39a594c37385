//! Playback of page audio.

pub mod output;
pub mod session;

pub use output::{AudioOutput, CommandPlayer, MockOutput, OutputEvent};
pub use session::PlaybackSession;
