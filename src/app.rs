//! Document reading application.
//!
//! Wires configuration, services and the page pipeline together for the two
//! front-ends: `process` (batch export) and `read` (interactive playback).

use crate::cli::{READER_HELP, ReaderCommand, parse_reader_command};
use crate::config::Config;
use crate::document::{PageSource, TextDocument};
use crate::enrich::Enricher;
use crate::error::Result;
use crate::export::export_store;
use crate::pipeline::{
    BarProgress, JobOutcome, LogProgress, NoProgress, PageStatus, PageStore, Pipeline,
    PipelineConfig, ProgressReporter,
};
use crate::playback::{AudioOutput, CommandPlayer, PlaybackSession};
use crate::services::openai::api_key_from_env;
use crate::services::{CompletionService, OpenAiCompletion, OpenAiSpeech, SpeechService};
use crate::synth::Synthesizer;
use owo_colors::OwoColorize;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Build a pipeline from configuration and explicit service implementations.
///
/// `jobs` overrides the configured pool size.
pub fn assemble_pipeline(
    config: &Config,
    source: Arc<dyn PageSource>,
    completion: Arc<dyn CompletionService>,
    speech: Arc<dyn SpeechService>,
    jobs: Option<usize>,
) -> Result<Pipeline> {
    config.validate()?;

    let synthesizer = Synthesizer::with_options(
        speech,
        &config.speech.voice,
        &config.speech.format,
        config.speech.max_chunk_chars,
    )?;
    let pipeline_config = PipelineConfig {
        max_concurrency: jobs.unwrap_or_else(|| config.effective_concurrency()),
        token_budget: config.pipeline.token_budget,
    };

    Ok(Pipeline::new(
        source,
        Enricher::new(completion),
        synthesizer,
        pipeline_config,
    ))
}

/// Build a pipeline talking to the configured HTTP services.
fn connect_pipeline(
    config: &Config,
    source: Arc<dyn PageSource>,
    jobs: Option<usize>,
) -> Result<Pipeline> {
    let api_key = api_key_from_env()?;
    let completion = OpenAiCompletion::new(&config.completion, api_key.clone())?;
    let speech = OpenAiSpeech::new(&config.speech, api_key)?;
    info!(
        completion_model = %config.completion.model,
        speech_model = %config.speech.model,
        voice = %config.speech.voice,
        "services configured"
    );
    assemble_pipeline(config, source, Arc::new(completion), Arc::new(speech), jobs)
}

/// Default output directory: `<document>.pagecast` next to the document.
pub fn default_output_dir(document: &Path) -> PathBuf {
    document.with_extension("pagecast")
}

/// Cancel the pipeline on Ctrl+C.
fn cancel_on_interrupt(pipeline: &Arc<Pipeline>) -> JoinHandle<()> {
    let pipeline = Arc::clone(pipeline);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, stopping page jobs...");
            pipeline.cancel();
        }
    })
}

/// Cancel the pipeline once `timeout` elapses.
fn cancel_after(pipeline: &Arc<Pipeline>, timeout: Duration) -> JoinHandle<()> {
    let pipeline = Arc::clone(pipeline);
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        warn!(timeout = ?timeout, "run timed out");
        pipeline.cancel();
    })
}

/// Run the process command: load every page, then export audio and manifest.
///
/// Returns the number of failed pages.
pub async fn run_process_command(
    config: Config,
    document: PathBuf,
    out: Option<PathBuf>,
    jobs: Option<usize>,
    timeout: Option<Duration>,
    quiet: bool,
) -> Result<usize> {
    let source = TextDocument::open(&document).await?;
    let page_count = source.page_count();
    if !quiet {
        eprintln!("Loaded {} ({} pages)", document.display(), page_count);
    }

    let progress: Arc<dyn ProgressReporter> = if quiet {
        Arc::new(NoProgress)
    } else {
        Arc::new(BarProgress::new())
    };
    let pipeline =
        Arc::new(connect_pipeline(&config, Arc::new(source), jobs)?.with_progress(progress));

    let mut watchers = vec![cancel_on_interrupt(&pipeline)];
    if let Some(timeout) = timeout {
        watchers.push(cancel_after(&pipeline, timeout));
    }
    let result = pipeline.run_default().await;
    for watcher in watchers {
        watcher.abort();
    }
    let outcomes = result?;

    let out_dir = out.unwrap_or_else(|| default_output_dir(&document));
    let manifest = export_store(pipeline.store(), page_count, &out_dir, &config.speech.format)?;

    let failed: Vec<&JobOutcome> = outcomes.iter().filter(|o| !o.is_success()).collect();
    if !quiet {
        println!(
            "Wrote {} of {} pages to {}",
            pipeline.store().len(),
            page_count,
            manifest.display()
        );
        for outcome in &failed {
            if let JobOutcome::Failure { page_index, error } = outcome {
                eprintln!(
                    "  {} page {}: {}",
                    "failed".red(),
                    page_index + 1,
                    error
                );
            }
        }
    }
    Ok(failed.len())
}

/// Run the read command: interactive playback over stdin.
///
/// Eager mode loads every page in the background while the reader is
/// already usable. Lazy mode loads a page when the reader moves to it.
pub async fn run_read_command(
    config: Config,
    document: PathBuf,
    lazy: bool,
    jobs: Option<usize>,
    quiet: bool,
) -> Result<()> {
    let source = TextDocument::open(&document).await?;
    let page_count = source.page_count();
    let pipeline = Arc::new(
        connect_pipeline(&config, Arc::new(source), jobs)?.with_progress(Arc::new(LogProgress::new())),
    );

    if !quiet {
        eprintln!(
            "Reading {} ({} pages). Type 'help' for commands.",
            document.display(),
            page_count
        );
    }

    let background = if lazy {
        if page_count > 0 {
            report_outcome(&pipeline.run_one(0).await?);
        }
        None
    } else {
        let runner = Arc::clone(&pipeline);
        Some(tokio::spawn(async move { runner.run_default().await }))
    };

    let output = CommandPlayer::new(config.playback.player.clone(), config.playback.player_args.clone());
    let mut session = PlaybackSession::new(pipeline.store().clone(), page_count, output);
    let result = reader_loop(&pipeline, &mut session, lazy).await;

    session.stop()?;
    pipeline.cancel();
    if let Some(handle) = background {
        match handle.await {
            Ok(Err(e)) => warn!(error = %e, "background loading failed"),
            Err(e) => warn!(error = %e, "background loading task did not complete"),
            Ok(Ok(_)) => {}
        }
    }
    result
}

async fn reader_loop<O: AudioOutput>(
    pipeline: &Pipeline,
    session: &mut PlaybackSession<O>,
    lazy: bool,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(session);
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        let command = match parse_reader_command(&line) {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };

        match command {
            ReaderCommand::Quit => return Ok(()),
            ReaderCommand::Help => eprintln!("{READER_HELP}"),
            ReaderCommand::Status => {
                print!(
                    "{}",
                    describe_pages(pipeline.store(), session.page_count(), session.current_page())
                );
            }
            ReaderCommand::Play(artifact) => match session.play(artifact) {
                Ok(record) => {
                    println!(
                        "{}",
                        format!("Page {} {}", record.page_index + 1, artifact).bold()
                    );
                    println!("{}", record.text_of(artifact));
                }
                Err(e) => eprintln!("{e}"),
            },
            ReaderCommand::Stop => session.stop()?,
            ReaderCommand::Pause => session.pause()?,
            ReaderCommand::Resume => session.resume()?,
            ReaderCommand::Next => {
                if lazy && let Some(target) = session.following_index() {
                    let outcome = pipeline.run_one(target).await?;
                    report_outcome(&outcome);
                    if outcome.is_success() {
                        announce(session.go_to(target).map(|_| target).ok());
                    }
                } else {
                    announce(session.next_page()?);
                }
            }
            ReaderCommand::Prev => announce(session.prev_page()?),
            ReaderCommand::Page(number) => {
                let target = number - 1;
                if target >= session.page_count() {
                    eprintln!("The document has {} pages", session.page_count());
                    continue;
                }
                if lazy {
                    report_outcome(&pipeline.run_one(target).await?);
                }
                match session.go_to(target) {
                    Ok(_) => announce(Some(target)),
                    Err(e) => eprintln!("{e}"),
                }
            }
        }
    }
}

fn prompt<O: AudioOutput>(session: &PlaybackSession<O>) {
    match session.current_page() {
        Some(page) => eprint!("[{}/{}]> ", page + 1, session.page_count()),
        None => eprint!("[-/{}]> ", session.page_count()),
    }
    if let Err(e) = std::io::stderr().flush() {
        warn!(error = %e, "failed to flush prompt");
    }
}

fn announce(page: Option<usize>) {
    match page {
        Some(page) => eprintln!("Page {}", page + 1),
        None => eprintln!("No pages loaded yet"),
    }
}

fn report_outcome(outcome: &JobOutcome) {
    if let JobOutcome::Failure { page_index, error } = outcome {
        eprintln!("{} page {}: {}", "failed".red(), page_index + 1, error);
    }
}

/// One line per page: loaded, pending or failed with its reason.
pub fn describe_pages(store: &PageStore, page_count: usize, current: Option<usize>) -> String {
    let mut out = String::new();
    for page in 0..page_count {
        let marker = if current == Some(page) { '*' } else { ' ' };
        let status = match store.status(page) {
            PageStatus::Ready(_) => "ready".to_string(),
            PageStatus::NotReady => "pending".to_string(),
            PageStatus::Failed(reason) => format!("failed: {reason}"),
        };
        out.push_str(&format!("{marker} {:>4}  {status}\n", page + 1));
    }
    out
}
