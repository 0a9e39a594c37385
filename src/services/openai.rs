//! OpenAI-compatible HTTP implementations of the completion and speech services.
//!
//! Works with the hosted API as well as local servers that mirror its
//! `/chat/completions` and `/audio/speech` endpoints.

use crate::config::{CompletionConfig, SpeechConfig};
use crate::defaults;
use crate::error::{PagecastError, Result};
use crate::services::completion::CompletionService;
use crate::services::speech::SpeechService;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// Read the API key from the environment.
pub fn api_key_from_env() -> Result<String> {
    match std::env::var(defaults::API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(PagecastError::MissingCredential {
            name: defaults::API_KEY_ENV.to_string(),
        }),
    }
}

fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| PagecastError::Other(format!("Failed to create HTTP client: {e}")))
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

/// Extract `choices[0].message.content` from a chat completion response.
pub fn parse_chat_response(body: &serde_json::Value) -> Result<String> {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| {
            PagecastError::service("completion", "response has no choices[0].message.content")
        })
}

async fn error_for_status(service: &str, response: reqwest::Response) -> PagecastError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or(body);
    PagecastError::service(service, format!("HTTP {status}: {detail}"))
}

/// Chat completion client.
pub struct OpenAiCompletion {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
}

impl OpenAiCompletion {
    pub fn new(config: &CompletionConfig, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            url: endpoint(&config.base_url, "chat/completions"),
            model: config.model.clone(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            max_tokens,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PagecastError::service("completion", format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(error_for_status("completion", response).await);
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PagecastError::service("completion", format!("malformed response: {e}")))?;
        parse_chat_response(&body)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Text-to-speech client.
pub struct OpenAiSpeech {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
}

impl OpenAiSpeech {
    pub fn new(config: &SpeechConfig, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            url: endpoint(&config.base_url, "audio/speech"),
            model: config.model.clone(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl SpeechService for OpenAiSpeech {
    async fn synthesize_speech(&self, text: &str, voice: &str, format: &str) -> Result<Vec<u8>> {
        let len = text.chars().count();
        if len > defaults::SPEECH_INPUT_LIMIT {
            return Err(PagecastError::InputTooLarge {
                len,
                limit: defaults::SPEECH_INPUT_LIMIT,
            });
        }

        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice,
            response_format: format,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PagecastError::service("speech", format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(error_for_status("speech", response).await);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PagecastError::service("speech", format!("failed to read audio: {e}")))?;
        debug!(chars = len, bytes = bytes.len(), "speech chunk synthesized");
        Ok(bytes.to_vec())
    }

    fn max_input_chars(&self) -> usize {
        defaults::SPEECH_INPUT_LIMIT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_chat_response() {
        let body = json!({
            "choices": [{ "message": { "role": "assistant", "content": "  A summary. \n" } }]
        });
        assert_eq!(parse_chat_response(&body).unwrap(), "A summary.");
    }

    #[test]
    fn test_parse_chat_response_without_choices() {
        let body = json!({ "error": { "message": "quota exceeded" } });
        match parse_chat_response(&body) {
            Err(PagecastError::Service { service, .. }) => assert_eq!(service, "completion"),
            other => panic!("Expected Service error, got {:?}", other),
        }
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        assert_eq!(
            endpoint("https://api.openai.com/v1/", "audio/speech"),
            "https://api.openai.com/v1/audio/speech"
        );
        assert_eq!(
            endpoint("http://localhost:8080/v1", "chat/completions"),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_chat_request_shape() {
        let request = ChatRequest {
            model: "m",
            messages: [
                ChatMessage {
                    role: "system",
                    content: "s",
                },
                ChatMessage {
                    role: "user",
                    content: "u",
                },
            ],
            max_tokens: 7,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["max_tokens"], 7);
    }

    #[tokio::test]
    async fn test_speech_rejects_oversized_input_before_sending() {
        let speech = OpenAiSpeech::new(&SpeechConfig::default(), "key").unwrap();
        let text = "x".repeat(defaults::SPEECH_INPUT_LIMIT + 1);
        let result = speech.synthesize_speech(&text, "alloy", "mp3").await;
        assert!(matches!(result, Err(PagecastError::InputTooLarge { .. })));
    }
}
