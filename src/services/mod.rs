//! Remote collaborators: text completion and speech synthesis.
//!
//! Both are traits so the pipeline can run against mocks in tests and
//! against any OpenAI-compatible endpoint in production.

pub mod completion;
#[cfg(feature = "http")]
pub mod openai;
pub mod speech;

pub use completion::{CompletionService, MockCompletion};
#[cfg(feature = "http")]
pub use openai::{OpenAiCompletion, OpenAiSpeech};
pub use speech::{MockSpeech, SpeechService};
