//! Page pipeline: runs one job per page on a bounded worker pool.

use crate::defaults;
use crate::document::PageSource;
use crate::enrich::Enricher;
use crate::error::{PagecastError, Result};
use crate::pipeline::job::{JobContext, PageJob};
use crate::pipeline::progress::{NoProgress, ProgressReporter};
use crate::pipeline::store::{PageStatus, PageStore};
use crate::pipeline::types::{JobOutcome, PageRecord};
use crate::synth::Synthesizer;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Configuration for the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Worker pool size used by [`Pipeline::run_default`]
    pub max_concurrency: usize,
    /// Token budget for each summary and interpretation
    pub token_budget: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: defaults::max_concurrency(),
            token_budget: defaults::TOKEN_BUDGET,
        }
    }
}

/// Document pipeline: PageSource → Enricher → Synthesizer → PageStore.
///
/// Supports two drivers over the same jobs and store: [`run_all`] processes
/// every page eagerly, [`run_one`] processes a single page on demand.
///
/// [`run_all`]: Pipeline::run_all
/// [`run_one`]: Pipeline::run_one
pub struct Pipeline {
    config: PipelineConfig,
    ctx: JobContext,
    store: PageStore,
    progress: Arc<dyn ProgressReporter>,
    cancel: CancellationToken,
}

impl Pipeline {
    /// Creates a new pipeline with an empty store and no progress output.
    pub fn new(
        source: Arc<dyn PageSource>,
        enricher: Enricher,
        synthesizer: Synthesizer,
        config: PipelineConfig,
    ) -> Self {
        let ctx = JobContext {
            source,
            enricher: Arc::new(enricher),
            synthesizer: Arc::new(synthesizer),
            token_budget: config.token_budget,
        };
        Self {
            config,
            ctx,
            store: PageStore::new(),
            progress: Arc::new(NoProgress),
            cancel: CancellationToken::new(),
        }
    }

    /// Sets a custom progress reporter.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Handle to the result store, for readers outside the pool.
    pub fn store(&self) -> &PageStore {
        &self.store
    }

    pub fn page_count(&self) -> usize {
        self.ctx.source.page_count()
    }

    /// The finished record for a page, or `None` while it is not ready.
    pub fn get_page_record(&self, page_index: usize) -> Option<Arc<PageRecord>> {
        self.store.get(page_index)
    }

    /// Ask running and queued jobs to stop.
    ///
    /// Queued jobs fail without calling any service; running jobs stop at
    /// their next service call. No partial record is ever published. A
    /// cancelled pipeline stays cancelled.
    pub fn cancel(&self) {
        info!("pipeline cancellation requested");
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Process every page of the document with the configured pool size.
    pub async fn run_default(&self) -> Result<Vec<JobOutcome>> {
        self.run_all(self.config.max_concurrency).await
    }

    /// Process every page of the document.
    pub async fn run_all(&self, max_concurrency: usize) -> Result<Vec<JobOutcome>> {
        self.run(self.page_count(), max_concurrency).await
    }

    /// Process pages `0..page_count` with at most `max_concurrency` jobs
    /// active at any instant.
    ///
    /// Pages the store already holds, published or failed, are not run
    /// again; their stored outcome is reported instead. Outcomes are
    /// returned in completion order, one per page. A failed page is recorded
    /// and the run continues; it returns once every job is terminal.
    ///
    /// # Errors
    /// [`PagecastError::ConfigInvalidValue`] if `max_concurrency` is 0, and
    /// [`PagecastError::PublishConflict`] if another driver publishes a page
    /// while its job is running, which aborts the remaining jobs.
    pub async fn run(&self, page_count: usize, max_concurrency: usize) -> Result<Vec<JobOutcome>> {
        if max_concurrency == 0 {
            return Err(PagecastError::ConfigInvalidValue {
                key: "max_concurrency".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        let mut outcomes = Vec::with_capacity(page_count);
        let mut pending = BTreeSet::new();
        for page in 0..page_count {
            match self.stored_outcome(page) {
                Some(outcome) => outcomes.push(outcome),
                None => {
                    pending.insert(page);
                }
            }
        }

        info!(
            pages = page_count,
            scheduled = pending.len(),
            workers = max_concurrency,
            "starting pipeline run"
        );
        self.progress.started(pending.len());

        let pool = Arc::new(Semaphore::new(max_concurrency));
        let mut tasks = JoinSet::new();
        for &page in &pending {
            let job = PageJob::new(page, self.ctx.clone(), self.cancel.child_token());
            let pool = Arc::clone(&pool);
            let progress = Arc::clone(&self.progress);
            tasks.spawn(run_pooled(job, pool, progress));
        }

        while let Some(joined) = tasks.join_next().await {
            let (page, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    // Page is identified below from the pending set
                    error!(error = %e, "page job task did not complete");
                    continue;
                }
            };
            pending.remove(&page);

            match result {
                Ok(record) => match self.store.publish(record) {
                    Ok(record) => outcomes.push(JobOutcome::Success(record)),
                    Err(e) => {
                        error!(page, error = %e, "aborting run");
                        tasks.abort_all();
                        self.progress.finished();
                        return Err(e);
                    }
                },
                Err(error) => {
                    self.store.record_failure(page, error.to_string());
                    outcomes.push(JobOutcome::Failure {
                        page_index: page,
                        error,
                    });
                }
            }
        }

        for page in pending {
            let error = PagecastError::Other("page job panicked".to_string());
            self.store.record_failure(page, error.to_string());
            self.progress.page_finished(page, false);
            outcomes.push(JobOutcome::Failure {
                page_index: page,
                error,
            });
        }

        self.progress.finished();
        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        info!(pages = page_count, failed, "pipeline run finished");
        Ok(outcomes)
    }

    /// Process a single page, unless the store already holds it.
    ///
    /// Runs on the caller's task, outside the worker pool. A published page
    /// returns its record and a page whose job failed earlier returns that
    /// failure. Neither calls a service.
    ///
    /// # Errors
    /// Only [`PagecastError::PublishConflict`], when another driver published
    /// the page while this job ran. Job failures are returned as
    /// [`JobOutcome::Failure`].
    pub async fn run_one(&self, page_index: usize) -> Result<JobOutcome> {
        if let Some(outcome) = self.stored_outcome(page_index) {
            debug!(page = page_index, ok = outcome.is_success(), "page already settled");
            return Ok(outcome);
        }

        let mut job = PageJob::new(page_index, self.ctx.clone(), self.cancel.child_token());
        match job.run().await {
            Ok(record) => Ok(JobOutcome::Success(self.store.publish(record)?)),
            Err(error) => {
                self.store.record_failure(page_index, error.to_string());
                Ok(JobOutcome::Failure { page_index, error })
            }
        }
    }

    /// The outcome already held by the store, or `None` for a page still to run.
    fn stored_outcome(&self, page_index: usize) -> Option<JobOutcome> {
        match self.store.status(page_index) {
            PageStatus::Ready(record) => Some(JobOutcome::Success(record)),
            PageStatus::Failed(reason) => Some(JobOutcome::Failure {
                page_index,
                error: PagecastError::Other(reason),
            }),
            PageStatus::NotReady => None,
        }
    }
}

/// Run one job while holding a pool slot.
async fn run_pooled(
    mut job: PageJob,
    pool: Arc<Semaphore>,
    progress: Arc<dyn ProgressReporter>,
) -> (usize, Result<PageRecord>) {
    let page = job.page_index();
    let _permit = match pool.acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            return (
                page,
                Err(PagecastError::Other("worker pool closed".to_string())),
            );
        }
    };

    progress.page_started(page);
    let result = job.run().await;
    progress.page_finished(page, result.is_ok());
    (page, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MockPageSource;
    use crate::services::{MockCompletion, MockSpeech};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn pipeline(source: MockPageSource, completion: MockCompletion, speech: MockSpeech) -> Pipeline {
        Pipeline::new(
            Arc::new(source),
            Enricher::new(Arc::new(completion)),
            Synthesizer::new(Arc::new(speech)).unwrap(),
            PipelineConfig {
                max_concurrency: 2,
                token_budget: 100,
            },
        )
    }

    #[tokio::test]
    async fn test_run_all_publishes_every_page() {
        let p = pipeline(MockPageSource::numbered(5), MockCompletion::new(), MockSpeech::new());

        let outcomes = p.run_all(3).await.unwrap();

        assert_eq!(outcomes.len(), 5);
        assert!(outcomes.iter().all(JobOutcome::is_success));
        assert_eq!(p.store().published(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_rejected() {
        let p = pipeline(MockPageSource::numbered(1), MockCompletion::new(), MockSpeech::new());
        assert!(matches!(
            p.run(1, 0).await,
            Err(PagecastError::ConfigInvalidValue { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_page_is_recorded_and_others_continue() {
        let p = pipeline(
            MockPageSource::numbered(4).with_failing_page(2),
            MockCompletion::new(),
            MockSpeech::new(),
        );

        let outcomes = p.run_default().await.unwrap();

        assert_eq!(outcomes.len(), 4);
        let failures: Vec<usize> = outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(JobOutcome::page_index)
            .collect();
        assert_eq!(failures, vec![2]);
        assert_eq!(p.store().len(), 3);
        assert!(matches!(p.store().status(2), PageStatus::Failed(_)));
    }

    #[tokio::test]
    async fn test_empty_document() {
        let p = pipeline(MockPageSource::default(), MockCompletion::new(), MockSpeech::new());
        let outcomes = p.run_all(4).await.unwrap();
        assert!(outcomes.is_empty());
        assert!(p.store().is_empty());
    }

    /// Counts every progress callback.
    #[derive(Default)]
    struct CountingProgress {
        total: AtomicUsize,
        page_started: AtomicUsize,
        page_finished: AtomicUsize,
        finished: AtomicUsize,
    }

    impl ProgressReporter for CountingProgress {
        fn started(&self, total: usize) {
            self.total.store(total, Ordering::SeqCst);
        }

        fn page_started(&self, _page_index: usize) {
            self.page_started.fetch_add(1, Ordering::SeqCst);
        }

        fn page_finished(&self, _page_index: usize, _ok: bool) {
            self.page_finished.fetch_add(1, Ordering::SeqCst);
        }

        fn finished(&self) {
            self.finished.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_run_skips_published_pages() {
        let completion = Arc::new(MockCompletion::new());
        let progress = Arc::new(CountingProgress::default());
        let p = Pipeline::new(
            Arc::new(MockPageSource::numbered(2)),
            Enricher::new(completion.clone()),
            Synthesizer::new(Arc::new(MockSpeech::new())).unwrap(),
            PipelineConfig::default(),
        )
        .with_progress(progress.clone());
        let preloaded = p.run_one(1).await.unwrap();
        let per_page = completion.calls();

        let outcomes = p.run_all(2).await.unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(JobOutcome::is_success));
        assert_eq!(completion.calls(), 2 * per_page);
        let reported = outcomes.iter().find(|o| o.page_index() == 1).unwrap();
        match (reported, preloaded) {
            (JobOutcome::Success(a), JobOutcome::Success(b)) => assert!(Arc::ptr_eq(a, &b)),
            _ => panic!("page 1 should be reported from the store"),
        }
        assert_eq!(progress.total.load(Ordering::SeqCst), 1);
        assert_eq!(progress.page_started.load(Ordering::SeqCst), 1);
        assert_eq!(progress.page_finished.load(Ordering::SeqCst), 1);
        assert_eq!(progress.finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_reports_earlier_failure_without_rerunning() {
        let completion = Arc::new(MockCompletion::failing_when("page 1"));
        let p = Pipeline::new(
            Arc::new(MockPageSource::numbered(2)),
            Enricher::new(completion.clone()),
            Synthesizer::new(Arc::new(MockSpeech::new())).unwrap(),
            PipelineConfig::default(),
        );
        assert!(!p.run_one(1).await.unwrap().is_success());
        let before = completion.calls();

        let outcomes = p.run_all(2).await.unwrap();

        assert_eq!(outcomes.len(), 2);
        let failed: Vec<usize> = outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(JobOutcome::page_index)
            .collect();
        assert_eq!(failed, vec![1]);
        // Only page 0 made new calls
        assert_eq!(completion.calls(), before + 2);
        assert_eq!(p.store().published(), vec![0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_conflict_aborts_run_and_finishes_progress() {
        let progress = Arc::new(CountingProgress::default());
        let p = Arc::new(
            pipeline(
                MockPageSource::numbered(2),
                MockCompletion::new().with_delay(Duration::from_secs(1)),
                MockSpeech::new(),
            )
            .with_progress(progress.clone()),
        );

        // One worker: page 1 starts only after page 0, at t=1s
        let runner = Arc::clone(&p);
        let handle = tokio::spawn(async move { runner.run_all(1).await });
        // Published at t=1s, while the eager job for page 1 is still running
        assert!(p.run_one(1).await.unwrap().is_success());

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, PagecastError::PublishConflict { page: 1 }));
        assert!(err.is_fatal());
        assert_eq!(progress.finished.load(Ordering::SeqCst), 1);
        assert_eq!(p.store().published(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_panicked_job_is_reported_as_finished_failure() {
        struct PanickingSource;

        #[async_trait::async_trait]
        impl PageSource for PanickingSource {
            fn page_count(&self) -> usize {
                3
            }

            async fn extract_page_text(&self, page_index: usize) -> Result<String> {
                if page_index == 1 {
                    panic!("extractor crashed");
                }
                Ok(format!("page {page_index}"))
            }
        }

        let progress = Arc::new(CountingProgress::default());
        let p = Pipeline::new(
            Arc::new(PanickingSource),
            Enricher::new(Arc::new(MockCompletion::new())),
            Synthesizer::new(Arc::new(MockSpeech::new())).unwrap(),
            PipelineConfig::default(),
        )
        .with_progress(progress.clone());

        let outcomes = p.run_all(2).await.unwrap();

        assert_eq!(outcomes.len(), 3);
        let failed: Vec<usize> = outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(JobOutcome::page_index)
            .collect();
        assert_eq!(failed, vec![1]);
        assert_eq!(p.store().failure(1).as_deref(), Some("page job panicked"));
        assert_eq!(progress.page_finished.load(Ordering::SeqCst), 3);
        assert_eq!(progress.finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_one_is_idempotent_for_published_pages() {
        let completion = Arc::new(MockCompletion::new());
        let p = Pipeline::new(
            Arc::new(MockPageSource::numbered(3)),
            Enricher::new(completion.clone()),
            Synthesizer::new(Arc::new(MockSpeech::new())).unwrap(),
            PipelineConfig::default(),
        );

        let first = p.run_one(1).await.unwrap();
        let calls = completion.calls();
        let second = p.run_one(1).await.unwrap();

        assert!(first.is_success() && second.is_success());
        assert_eq!(completion.calls(), calls);
        assert_eq!(p.store().published(), vec![1]);
    }

    #[tokio::test]
    async fn test_run_one_reports_failure() {
        let p = pipeline(
            MockPageSource::numbered(2).with_failing_page(0),
            MockCompletion::new(),
            MockSpeech::new(),
        );

        let outcome = p.run_one(0).await.unwrap();

        assert!(!outcome.is_success());
        assert!(p.get_page_record(0).is_none());
        assert!(p.store().failure(0).is_some());
    }

    #[tokio::test]
    async fn test_run_one_does_not_retry_failed_page() {
        let completion = Arc::new(MockCompletion::failing_when("page 1"));
        let speech = Arc::new(MockSpeech::new());
        let p = Pipeline::new(
            Arc::new(MockPageSource::numbered(2)),
            Enricher::new(completion.clone()),
            Synthesizer::new(speech.clone()).unwrap(),
            PipelineConfig::default(),
        );
        assert!(!p.run_one(1).await.unwrap().is_success());
        let reason = p.store().failure(1).unwrap();
        let calls = (completion.calls(), speech.calls());

        match p.run_one(1).await.unwrap() {
            JobOutcome::Failure { page_index, error } => {
                assert_eq!(page_index, 1);
                assert_eq!(error.to_string(), reason);
            }
            JobOutcome::Success(_) => panic!("failed page must not be retried"),
        }
        assert_eq!((completion.calls(), speech.calls()), calls);
        assert_eq!(p.store().status(1), PageStatus::Failed(reason));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_publishes_nothing_partial() {
        let p = Arc::new(pipeline(
            MockPageSource::numbered(6),
            MockCompletion::new().with_delay(Duration::from_secs(10)),
            MockSpeech::new(),
        ));

        let runner = Arc::clone(&p);
        let handle = tokio::spawn(async move { runner.run_all(2).await });
        tokio::time::sleep(Duration::from_secs(1)).await;
        p.cancel();

        let outcomes = handle.await.unwrap().unwrap();

        assert_eq!(outcomes.len(), 6);
        assert!(outcomes.iter().all(|o| matches!(
            o,
            JobOutcome::Failure {
                error: PagecastError::Cancelled { .. },
                ..
            }
        )));
        assert!(p.store().is_empty());
        assert!(p.is_cancelled());
    }
}
