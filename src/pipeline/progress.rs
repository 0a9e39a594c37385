//! Progress reporting for pipeline runs.
//!
//! Reporting is observational only; the pipeline's results never depend on it.

use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

/// Receives progress events from a running pipeline.
///
/// `page_started` and `page_finished` are called from worker tasks while the
/// job holds its pool slot, so they bracket exactly the time a job is active.
pub trait ProgressReporter: Send + Sync {
    fn started(&self, total: usize);
    fn page_started(&self, _page_index: usize) {}
    fn page_finished(&self, page_index: usize, ok: bool);
    fn finished(&self);
}

/// Reporter that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn started(&self, _total: usize) {}
    fn page_finished(&self, _page_index: usize, _ok: bool) {}
    fn finished(&self) {}
}

/// Reporter that logs "N of total" lines through `tracing`.
#[derive(Debug, Default)]
pub struct LogProgress {
    total: AtomicUsize,
    done: AtomicUsize,
    failed: AtomicUsize,
}

impl LogProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressReporter for LogProgress {
    fn started(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        self.done.store(0, Ordering::SeqCst);
        self.failed.store(0, Ordering::SeqCst);
        info!(total, "loading pages");
    }

    fn page_finished(&self, page_index: usize, ok: bool) {
        let done = self.done.fetch_add(1, Ordering::SeqCst) + 1;
        if !ok {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
        let total = self.total.load(Ordering::SeqCst);
        info!(page = page_index, ok, "{done} of {total} pages done");
    }

    fn finished(&self) {
        info!(
            done = self.done.load(Ordering::SeqCst),
            failed = self.failed.load(Ordering::SeqCst),
            "all pages loaded"
        );
    }
}

/// Terminal progress bar.
#[cfg(feature = "cli")]
pub struct BarProgress {
    bar: indicatif::ProgressBar,
}

#[cfg(feature = "cli")]
impl BarProgress {
    pub fn new() -> Self {
        let bar = indicatif::ProgressBar::new(0);
        bar.set_style(
            indicatif::ProgressStyle::with_template(
                "{spinner:.green} Loading pages [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            )
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        Self { bar }
    }
}

#[cfg(feature = "cli")]
impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "cli")]
impl ProgressReporter for BarProgress {
    fn started(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
    }

    fn page_finished(&self, page_index: usize, ok: bool) {
        if !ok {
            self.bar.println(format!("Page {} failed", page_index + 1));
        }
        self.bar.inc(1);
    }

    fn finished(&self) {
        self.bar.finish_with_message("done");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_progress_counts() {
        let progress = LogProgress::new();
        progress.started(3);
        progress.page_finished(0, true);
        progress.page_finished(2, false);
        progress.finished();

        assert_eq!(progress.done.load(Ordering::SeqCst), 2);
        assert_eq!(progress.failed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_started_resets_counts() {
        let progress = LogProgress::new();
        progress.started(1);
        progress.page_finished(0, false);
        progress.started(5);

        assert_eq!(progress.done.load(Ordering::SeqCst), 0);
        assert_eq!(progress.failed.load(Ordering::SeqCst), 0);
        assert_eq!(progress.total.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_no_progress_is_object_safe() {
        let reporter: Box<dyn ProgressReporter> = Box::new(NoProgress);
        reporter.started(1);
        reporter.page_started(0);
        reporter.page_finished(0, true);
        reporter.finished();
    }
}
