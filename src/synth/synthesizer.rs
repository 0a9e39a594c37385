//! Speech synthesis of whole artifacts.

use crate::defaults;
use crate::error::{PagecastError, Result};
use crate::services::speech::SpeechService;
use crate::synth::chunker::split;
use std::sync::Arc;
use tracing::debug;

/// Audio for one artifact, one buffer per chunk, in reading order.
pub type AudioChunkSequence = Vec<Vec<u8>>;

/// Join chunk audio by plain byte concatenation in sequence order.
pub fn concat(chunks: AudioChunkSequence) -> Vec<u8> {
    chunks.concat()
}

/// Turns text into audio through a [`SpeechService`].
pub struct Synthesizer {
    speech: Arc<dyn SpeechService>,
    voice: String,
    format: String,
    max_chunk_len: usize,
}

impl Synthesizer {
    /// Create a synthesizer with the default voice, format and chunk length.
    pub fn new(speech: Arc<dyn SpeechService>) -> Result<Self> {
        Self::with_options(
            speech,
            defaults::VOICE,
            defaults::AUDIO_FORMAT,
            defaults::MAX_CHUNK_CHARS,
        )
    }

    /// Create a synthesizer with explicit options.
    ///
    /// # Errors
    /// Returns [`PagecastError::InputTooLarge`] when `max_chunk_len` exceeds
    /// what the speech service accepts in one call, and
    /// [`PagecastError::ConfigInvalidValue`] when it is 0.
    pub fn with_options(
        speech: Arc<dyn SpeechService>,
        voice: &str,
        format: &str,
        max_chunk_len: usize,
    ) -> Result<Self> {
        if max_chunk_len == 0 {
            return Err(PagecastError::ConfigInvalidValue {
                key: "speech.max_chunk_chars".to_string(),
                message: "must be positive".to_string(),
            });
        }
        let limit = speech.max_input_chars();
        if max_chunk_len > limit {
            return Err(PagecastError::InputTooLarge {
                len: max_chunk_len,
                limit,
            });
        }
        Ok(Self {
            speech,
            voice: voice.to_string(),
            format: format.to_string(),
            max_chunk_len,
        })
    }

    /// Synthesize one chunk with a single service call.
    ///
    /// A service answering a non-empty chunk with no audio is treated as a
    /// failure, so that audio is present exactly when text is.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let len = text.chars().count();
        let limit = self.speech.max_input_chars();
        if len > limit {
            return Err(PagecastError::InputTooLarge { len, limit });
        }

        let audio = self
            .speech
            .synthesize_speech(text, &self.voice, &self.format)
            .await?;
        if audio.is_empty() && !text.is_empty() {
            return Err(PagecastError::service(
                "speech",
                format!("empty audio returned for a {len}-character chunk"),
            ));
        }
        Ok(audio)
    }

    /// Synthesize text of any length, chunk by chunk.
    ///
    /// Chunks are sent one after another in reading order. The first failing
    /// chunk fails the whole call; no partial audio is returned. Empty text
    /// yields an empty sequence without calling the service.
    pub async fn synthesize_long(&self, text: &str) -> Result<AudioChunkSequence> {
        let chunks = split(text, self.max_chunk_len);
        let mut audio = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.enumerate() {
            let bytes = self.synthesize(chunk).await?;
            debug!(chunk = i, bytes = bytes.len(), "chunk synthesized");
            audio.push(bytes);
        }
        Ok(audio)
    }
}
