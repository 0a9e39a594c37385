//! Audio output devices for playback.
//!
//! The `AudioOutput` trait keeps the playback session testable without a
//! sound card: production code pipes audio into an external player process.

use crate::error::{PagecastError, Result};
use crate::sys;
use std::io::Write;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

/// Trait for something that can play an encoded audio stream.
pub trait AudioOutput: Send {
    /// Start playing `audio`, replacing whatever was playing.
    fn play(&mut self, audio: &[u8]) -> Result<()>;

    /// Stop playback. Stopping when idle is not an error.
    fn stop(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    fn resume(&mut self) -> Result<()>;
}

/// Plays audio by piping it into an external player (ffplay, mpv, ...).
///
/// Pause and resume suspend and continue the player process.
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
    child: Option<Child>,
}

impl CommandPlayer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            child: None,
        }
    }

    fn signal(&self, signal: libc::c_int) -> Result<()> {
        let Some(child) = &self.child else {
            return Ok(());
        };
        sys::send_signal(child.id(), signal).map_err(|e| PagecastError::Playback {
            message: format!("failed to signal {}: {}", self.program, e),
        })
    }
}

impl AudioOutput for CommandPlayer {
    fn play(&mut self, audio: &[u8]) -> Result<()> {
        self.stop()?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PagecastError::Playback {
                        message: format!(
                            "{} not found. Install it or set playback.player in the config",
                            self.program
                        ),
                    }
                } else {
                    PagecastError::Playback {
                        message: format!("failed to start {}: {}", self.program, e),
                    }
                }
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            let audio = audio.to_vec();
            // The player reads while it plays; feed it without blocking the caller.
            thread::spawn(move || {
                if let Err(e) = stdin.write_all(&audio) {
                    tracing::debug!(error = %e, "player closed its input early");
                }
            });
        }

        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(mut child) = self.child.take() {
            // A suspended player would never see the kill otherwise
            if let Err(e) = sys::send_signal(child.id(), libc::SIGCONT) {
                tracing::debug!(error = %e, "could not continue player");
            }
            if let Err(e) = child.kill() {
                tracing::debug!(error = %e, "player already exited");
            }
            child.wait()?;
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.signal(libc::SIGSTOP)
    }

    fn resume(&mut self) -> Result<()> {
        self.signal(libc::SIGCONT)
    }
}

impl Drop for CommandPlayer {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            eprintln!("pagecast: failed to stop player: {e}");
        }
    }
}

/// Something a [`MockOutput`] was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    Play(Vec<u8>),
    Stop,
    Pause,
    Resume,
}

/// Mock output for testing; records every call.
#[derive(Debug, Clone, Default)]
pub struct MockOutput {
    events: Arc<Mutex<Vec<OutputEvent>>>,
}

impl MockOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far (shared between clones).
    pub fn events(&self) -> Vec<OutputEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, event: OutputEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl AudioOutput for MockOutput {
    fn play(&mut self, audio: &[u8]) -> Result<()> {
        self.push(OutputEvent::Play(audio.to_vec()));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.push(OutputEvent::Stop);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.push(OutputEvent::Pause);
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.push(OutputEvent::Resume);
        Ok(())
    }
}
