//! Default configuration constants for pagecast.
//!
//! Shared between the config types, the CLI and the pipeline so that every
//! entry point starts from the same values.

/// Sentinel the completion service returns when a page has nothing to summarize.
pub const NO_CONTENT: &str = "No Content";

/// Sentinel the completion service returns when a page has nothing to interpret.
pub const NO_INTERPRETATION: &str = "No Interpretation";

/// Default token budget for each summary and interpretation.
pub const TOKEN_BUDGET: u32 = 1000;

/// Default maximum characters sent to the speech service in one call.
///
/// Kept below the 4096-character limit of the hosted speech endpoint so that
/// multi-byte heavy pages still fit.
pub const MAX_CHUNK_CHARS: usize = 3000;

/// Per-call input limit of the hosted speech endpoint, in characters.
pub const SPEECH_INPUT_LIMIT: usize = 4096;

/// Default OpenAI-compatible API base URL.
pub const BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model for summaries and interpretations.
pub const COMPLETION_MODEL: &str = "gpt-4o-mini";

/// Default speech model.
pub const SPEECH_MODEL: &str = "tts-1";

/// Default synthesis voice.
pub const VOICE: &str = "alloy";

/// Default audio container returned by the speech service.
pub const AUDIO_FORMAT: &str = "mp3";

/// Default timeout for a completion request, in seconds.
pub const COMPLETION_TIMEOUT_SECS: u64 = 60;

/// Default timeout for a speech request, in seconds.
///
/// Long chunks take noticeably longer to synthesize than to summarize.
pub const SPEECH_TIMEOUT_SECS: u64 = 120;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default external audio player. Reads the audio stream from stdin.
pub const PLAYER: &str = "ffplay";

/// Default arguments for [`PLAYER`].
pub const PLAYER_ARGS: &[&str] = &["-nodisp", "-autoexit", "-loglevel", "quiet", "-"];

/// Upper bound for the automatically chosen worker pool size.
pub const MAX_AUTO_CONCURRENCY: usize = 16;

/// Worker pool size used when the configuration leaves it at 0 (auto).
///
/// Jobs spend nearly all their time waiting on the network, so the pool is
/// twice the core count, clamped to `1..=MAX_AUTO_CONCURRENCY`.
pub fn max_concurrency() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cores * 2).clamp(1, MAX_AUTO_CONCURRENCY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_concurrency_is_within_bounds() {
        let n = max_concurrency();
        assert!(n >= 1);
        assert!(n <= MAX_AUTO_CONCURRENCY);
    }

    #[test]
    fn chunk_size_fits_speech_limit() {
        assert!(MAX_CHUNK_CHARS <= SPEECH_INPUT_LIMIT);
    }
}
