use crate::error::Result;
use crate::services::completion::CompletionService;
use std::sync::Arc;
use tracing::debug;

use super::prompt::{self, Prompt};

/// Derived texts for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub summary: String,
    pub interpretation: String,
}

/// Derives a summary and an interpretation for page text.
///
/// Deciding whether a page is empty is left to the completion service: the
/// prompts ask it to answer with a sentinel, which is passed through as-is.
pub struct Enricher {
    completion: Arc<dyn CompletionService>,
}

impl Enricher {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }

    async fn ask(&self, prompt: Prompt, token_budget: u32) -> Result<String> {
        self.completion
            .complete(&prompt.system, &prompt.user, token_budget)
            .await
    }

    /// Summarize and interpret `page_text`, each within `token_budget` tokens.
    ///
    /// The two requests run concurrently and neither depends on the other;
    /// if either fails the whole call fails.
    pub async fn enrich(&self, page_text: &str, token_budget: u32) -> Result<Enrichment> {
        let (summary, interpretation) = tokio::try_join!(
            self.ask(prompt::summarization(page_text, token_budget), token_budget),
            self.ask(prompt::interpretation(page_text, token_budget), token_budget),
        )?;
        debug!(
            model = self.completion.model_name(),
            summary_chars = summary.len(),
            interpretation_chars = interpretation.len(),
            "page enriched"
        );
        Ok(Enrichment {
            summary,
            interpretation,
        })
    }
}
