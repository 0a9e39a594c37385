//! Per-page unit of work: extract → enrich → synthesize.

use crate::document::PageSource;
use crate::enrich::Enricher;
use crate::error::{PagecastError, Result};
use crate::pipeline::types::{JobState, PageRecord};
use crate::synth::{Synthesizer, concat};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Collaborators shared by every job of a pipeline.
#[derive(Clone)]
pub struct JobContext {
    pub source: Arc<dyn PageSource>,
    pub enricher: Arc<Enricher>,
    pub synthesizer: Arc<Synthesizer>,
    pub token_budget: u32,
}

/// Processes one page into a [`PageRecord`].
///
/// The job only reads its collaborators; publishing the record is left to
/// the caller, so nothing becomes visible until every field is filled.
pub struct PageJob {
    page_index: usize,
    state: JobState,
    ctx: JobContext,
    cancel: CancellationToken,
}

impl PageJob {
    pub fn new(page_index: usize, ctx: JobContext, cancel: CancellationToken) -> Self {
        Self {
            page_index,
            state: JobState::Pending,
            ctx,
            cancel,
        }
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    fn advance(&mut self, next: JobState) {
        debug_assert!(
            self.state.can_advance_to(&next),
            "illegal job transition {} -> {}",
            self.state,
            next
        );
        debug!(page = self.page_index, state = %next, "page job state");
        self.state = next;
    }

    /// Await a collaborator call unless the job is cancelled first.
    async fn guard<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(PagecastError::Cancelled { page: self.page_index }),
            result = call => result,
        }
    }

    /// Run the job to a terminal state.
    ///
    /// Returns the finished record, or the error that moved the job to
    /// [`JobState::Failed`]. Nothing is retried.
    pub async fn run(&mut self) -> Result<PageRecord> {
        match self.steps().await {
            Ok(record) => {
                self.advance(JobState::Done);
                Ok(record)
            }
            Err(e) => {
                warn!(page = self.page_index, state = %self.state, error = %e, "page job failed");
                self.advance(JobState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn steps(&mut self) -> Result<PageRecord> {
        let ctx = self.ctx.clone();
        let page = self.page_index;

        self.advance(JobState::Extracting);
        let text = self.guard(ctx.source.extract_page_text(page)).await?;

        self.advance(JobState::Enriching);
        let enrichment = self
            .guard(ctx.enricher.enrich(&text, ctx.token_budget))
            .await?;

        self.advance(JobState::Synthesizing);
        let synth = &ctx.synthesizer;
        let (text_audio, summary_audio, interpretation_audio) = self
            .guard(async {
                tokio::try_join!(
                    synth.synthesize_long(&text),
                    synth.synthesize_long(&enrichment.summary),
                    synth.synthesize_long(&enrichment.interpretation),
                )
            })
            .await?;

        Ok(PageRecord {
            page_index: page,
            text,
            summary: enrichment.summary,
            interpretation: enrichment.interpretation,
            text_audio: concat(text_audio),
            summary_audio: concat(summary_audio),
            interpretation_audio: concat(interpretation_audio),
        })
    }
}
