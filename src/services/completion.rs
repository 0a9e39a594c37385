use crate::defaults;
use crate::error::{PagecastError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Trait for a chat-style text completion service.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Complete a prompt pair.
    ///
    /// # Arguments
    /// * `system_prompt` - Instructions for the model
    /// * `user_prompt` - The request, including the page text
    /// * `max_tokens` - Upper bound on the response length
    ///
    /// # Errors
    /// Returns [`PagecastError::Service`] on auth, quota, network or
    /// malformed-response failures.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<String>;

    /// Name of the backing model, for logs.
    fn model_name(&self) -> &str;
}

#[async_trait]
impl<T: CompletionService + ?Sized> CompletionService for Arc<T> {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<String> {
        (**self).complete(system_prompt, user_prompt, max_tokens).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

type Responder = dyn Fn(&str, &str) -> Result<String> + Send + Sync;

/// Mock completion service for testing
///
/// By default it behaves like a well-instructed model: for a blank page it
/// returns the sentinel named in the system prompt, otherwise it echoes the
/// page text with a `summary:` or `interpretation:` prefix. Responses are
/// deterministic.
pub struct MockCompletion {
    responder: Arc<Responder>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockCompletion {
    /// Create a mock with the default sentinel-aware echo behavior
    pub fn new() -> Self {
        Self::with_responder(echo_response)
    }

    /// Create a mock that answers with a custom function of (system, user)
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&str, &str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a mock that fails every call
    pub fn failing() -> Self {
        Self::with_responder(|_, _| Err(PagecastError::service("completion", "mock completion failure")))
    }

    /// Fail any call whose user prompt contains `pattern`, echo otherwise
    pub fn failing_when(pattern: &str) -> Self {
        let pattern = pattern.to_string();
        Self::with_responder(move |system, user| {
            if user.contains(&pattern) {
                Err(PagecastError::service("completion", "mock completion failure"))
            } else {
                echo_response(system, user)
            }
        })
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

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new()
    }
}

fn echo_response(system: &str, user: &str) -> Result<String> {
    let summarizing = system.contains(defaults::NO_CONTENT);
    let text = user.split_once(": ").map(|(_, t)| t).unwrap_or(user).trim();
    Ok(match (summarizing, text.is_empty()) {
        (true, true) => defaults::NO_CONTENT.to_string(),
        (false, true) => defaults::NO_INTERPRETATION.to_string(),
        (true, false) => format!("summary: {text}"),
        (false, false) => format!("interpretation: {text}"),
    })
}

#[async_trait]
impl CompletionService for MockCompletion {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        _max_tokens: u32,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(system_prompt, user_prompt)
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
