//! Per-page enrichment pipeline.
//!
//! Each page becomes one [`PageJob`] (extract → enrich → synthesize). The
//! [`Pipeline`] runs jobs on a bounded pool of tokio tasks, publishes finished
//! records into the shared [`PageStore`] and keeps going when a page fails.

pub mod job;
pub mod orchestrator;
pub mod progress;
pub mod store;
pub mod types;

pub use job::{JobContext, PageJob};
pub use orchestrator::{Pipeline, PipelineConfig};
pub use progress::{LogProgress, NoProgress, ProgressReporter};
#[cfg(feature = "cli")]
pub use progress::BarProgress;
pub use store::{PageStatus, PageStore};
pub use types::{Artifact, JobOutcome, JobState, PageRecord};
