//! pagecast - Listen to documents page by page
//!
//! Every page is read aloud three ways: verbatim, summarized and
//! interpreted. Pages are processed concurrently on a bounded pool and
//! published into a shared store as they finish.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

#[cfg(feature = "cli")]
pub mod app;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod document;
pub mod enrich;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod playback;
pub mod services;
pub mod synth;
pub mod sys;

// Collaborator traits (source → enrich → synthesize → play)
pub use document::{MockPageSource, PageSource, TextDocument};
pub use playback::AudioOutput;
pub use services::{CompletionService, SpeechService};

// Pipeline
pub use pipeline::{Artifact, JobOutcome, PageRecord, PageStatus, PageStore, Pipeline, PipelineConfig};

// Error handling
pub use error::{PagecastError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }

    #[test]
    fn version_string_contains_plus_when_git_hash_present() {
        let ver = version_string();
        if option_env!("GIT_HASH").is_some_and(|h| !h.is_empty()) {
            assert!(
                ver.contains('+'),
                "With GIT_HASH set, version should contain '+', got: {}",
                ver
            );
        } else {
            assert_eq!(ver, env!("CARGO_PKG_VERSION"));
        }
    }
}
