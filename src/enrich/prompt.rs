//! Fixed prompt templates for page summaries and interpretations.

use crate::defaults::{NO_CONTENT, NO_INTERPRETATION};

/// A system/user prompt pair for one completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Prompt asking for a detailed summary of one page within `token_budget`.
///
/// The model is told to answer [`NO_CONTENT`] when the page has nothing to
/// summarize.
pub fn summarization(page_text: &str, token_budget: u32) -> Prompt {
    Prompt {
        system: format!(
            "The user is asking you to summarize a page of a document. \
             The summary will be converted to speech. \
             Strive to make your summary as detailed as possible while remaining \
             under a {token_budget} token limit. \
             If the page does not contain any content to summarize return \"{NO_CONTENT}\""
        ),
        user: format!("Summarize the following: {page_text}"),
    }
}

/// Prompt asking for a plain-language interpretation of one page within
/// `token_budget`.
///
/// The model is told to answer [`NO_INTERPRETATION`] when the page has
/// nothing to interpret.
pub fn interpretation(page_text: &str, token_budget: u32) -> Prompt {
    Prompt {
        system: format!(
            "The user is asking you to interpret a page of a document. \
             The interpretation will be converted to speech. \
             Strive to make your interpretation as detailed and as simple as possible \
             while remaining under a {token_budget} token limit. \
             If the page does not contain any content to interpret return \"{NO_INTERPRETATION}\""
        ),
        user: format!("Interpret the following: {page_text}"),
    }
}
