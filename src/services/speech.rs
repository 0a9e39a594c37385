use crate::defaults;
use crate::error::{PagecastError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Trait for a text-to-speech service.
#[async_trait]
pub trait SpeechService: Send + Sync {
    /// Synthesize `text` with the given voice into audio of the given format.
    ///
    /// # Errors
    /// Returns [`PagecastError::InputTooLarge`] when `text` exceeds
    /// [`max_input_chars`](Self::max_input_chars), and
    /// [`PagecastError::Service`] on any remote failure.
    async fn synthesize_speech(&self, text: &str, voice: &str, format: &str) -> Result<Vec<u8>>;

    /// Per-call input limit in characters.
    fn max_input_chars(&self) -> usize;
}

#[async_trait]
impl<T: SpeechService + ?Sized> SpeechService for Arc<T> {
    async fn synthesize_speech(&self, text: &str, voice: &str, format: &str) -> Result<Vec<u8>> {
        (**self).synthesize_speech(text, voice, format).await
    }

    fn max_input_chars(&self) -> usize {
        (**self).max_input_chars()
    }
}

/// Mock speech service for testing
///
/// Produces one byte per input character, so audio length mirrors text
/// length.
#[derive(Debug)]
pub struct MockSpeech {
    limit: usize,
    fail_on_call: Option<usize>,
    fail_pattern: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockSpeech {
    /// Create a mock with the hosted service's input limit
    pub fn new() -> Self {
        Self {
            limit: defaults::SPEECH_INPUT_LIMIT,
            fail_on_call: None,
            fail_pattern: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Override the per-call input limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Fail the `n`th call (0-based)
    pub fn with_failure_on_call(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    /// Fail any call whose text contains `pattern`
    pub fn with_failure_when(mut self, pattern: &str) -> Self {
        self.fail_pattern = Some(pattern.to_string());
        self
    }

    /// Sleep before answering, to simulate network latency
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of calls received so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockSpeech {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechService for MockSpeech {
    async fn synthesize_speech(&self, text: &str, _voice: &str, _format: &str) -> Result<Vec<u8>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let len = text.chars().count();
        if len > self.limit {
            return Err(PagecastError::InputTooLarge {
                len,
                limit: self.limit,
            });
        }
        if self.fail_on_call == Some(call)
            || self
                .fail_pattern
                .as_deref()
                .is_some_and(|p| text.contains(p))
        {
            return Err(PagecastError::service("speech", "mock synthesis failure"));
        }

        Ok(vec![b'a'; len])
    }

    fn max_input_chars(&self) -> usize {
        self.limit
    }
}
