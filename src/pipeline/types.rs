//! Data types flowing through the page pipeline.

use crate::error::PagecastError;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// One of the three things derived for every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Artifact {
    Text,
    Summary,
    Interpretation,
}

impl Artifact {
    pub const ALL: [Artifact; 3] = [Artifact::Text, Artifact::Summary, Artifact::Interpretation];

    pub fn as_str(self) -> &'static str {
        match self {
            Artifact::Text => "text",
            Artifact::Summary => "summary",
            Artifact::Interpretation => "interpretation",
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything produced for one page.
///
/// Built in full by a page job before it is published; never mutated after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub page_index: usize,
    pub text: String,
    pub summary: String,
    pub interpretation: String,
    pub text_audio: Vec<u8>,
    pub summary_audio: Vec<u8>,
    pub interpretation_audio: Vec<u8>,
}

impl PageRecord {
    /// Text of the given artifact.
    pub fn text_of(&self, artifact: Artifact) -> &str {
        match artifact {
            Artifact::Text => &self.text,
            Artifact::Summary => &self.summary,
            Artifact::Interpretation => &self.interpretation,
        }
    }

    /// Audio of the given artifact.
    pub fn audio_of(&self, artifact: Artifact) -> &[u8] {
        match artifact {
            Artifact::Text => &self.text_audio,
            Artifact::Summary => &self.summary_audio,
            Artifact::Interpretation => &self.interpretation_audio,
        }
    }
}

/// Result of one page job.
#[derive(Debug)]
pub enum JobOutcome {
    Success(Arc<PageRecord>),
    Failure {
        page_index: usize,
        error: PagecastError,
    },
}

impl JobOutcome {
    pub fn page_index(&self) -> usize {
        match self {
            JobOutcome::Success(record) => record.page_index,
            JobOutcome::Failure { page_index, .. } => *page_index,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success(_))
    }
}

/// Lifecycle of a page job.
///
/// `Pending → Extracting → Enriching → Synthesizing → Done`, or `Failed`
/// from any non-terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Extracting,
    Enriching,
    Synthesizing,
    Done,
    Failed(String),
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Failed(_))
    }

    /// Whether `next` is a legal successor of this state.
    pub fn can_advance_to(&self, next: &JobState) -> bool {
        use JobState::*;
        match (self, next) {
            (Pending, Extracting)
            | (Extracting, Enriching)
            | (Enriching, Synthesizing)
            | (Synthesizing, Done) => true,
            (from, Failed(_)) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Pending => write!(f, "pending"),
            JobState::Extracting => write!(f, "extracting"),
            JobState::Enriching => write!(f, "enriching"),
            JobState::Synthesizing => write!(f, "synthesizing"),
            JobState::Done => write!(f, "done"),
            JobState::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}
