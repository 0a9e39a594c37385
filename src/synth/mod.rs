//! Text-to-audio for whole artifacts.
//!
//! Long text is split into chunks that fit the speech service's per-call
//! limit, synthesized in reading order, and kept as an ordered sequence.

pub mod chunker;
pub mod synthesizer;

pub use chunker::{Chunks, split};
pub use synthesizer::{AudioChunkSequence, Synthesizer, concat};
