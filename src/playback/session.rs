use crate::error::{PagecastError, Result};
use crate::pipeline::{Artifact, PageRecord, PageStore};
use crate::playback::output::AudioOutput;
use std::sync::Arc;
use tracing::debug;

/// Front-end playback state: which page and artifact the user is on.
///
/// The current page only ever points at a page that is present in the
/// store, so background loading can never hand playback a half-built page.
pub struct PlaybackSession<O: AudioOutput> {
    store: PageStore,
    page_count: usize,
    current: Option<usize>,
    artifact: Artifact,
    output: O,
}

impl<O: AudioOutput> PlaybackSession<O> {
    pub fn new(store: PageStore, page_count: usize, output: O) -> Self {
        Self {
            store,
            page_count,
            current: None,
            artifact: Artifact::Text,
            output,
        }
    }

    pub fn current_page(&self) -> Option<usize> {
        self.current
    }

    pub fn artifact(&self) -> Artifact {
        self.artifact
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Record of the current page.
    pub fn current_record(&self) -> Option<Arc<PageRecord>> {
        self.current.and_then(|i| self.store.get(i))
    }

    /// Point at the first loaded page if nothing is selected yet.
    pub fn ensure_current(&mut self) -> Option<usize> {
        if self.current.is_none() {
            self.current = self.store.published().first().copied();
        }
        self.current
    }

    /// Jump to `page_index`.
    ///
    /// # Errors
    /// [`PagecastError::NotReady`] when the page is not in the store; the
    /// current page is left unchanged.
    pub fn go_to(&mut self, page_index: usize) -> Result<Arc<PageRecord>> {
        let record = self.store.require(page_index)?;
        self.output.stop()?;
        self.current = Some(page_index);
        debug!(page = page_index, "playback moved");
        Ok(record)
    }

    /// Index the reader would naturally go to next, wrapping to the first
    /// page after the last. Readiness is not checked.
    pub fn following_index(&self) -> Option<usize> {
        if self.page_count == 0 {
            return None;
        }
        Some(match self.current {
            Some(i) => (i + 1) % self.page_count,
            None => 0,
        })
    }

    /// Move to the next loaded page, wrapping around.
    ///
    /// Pages that are not loaded are skipped. Returns the new page, or
    /// `None` if nothing is loaded.
    pub fn next_page(&mut self) -> Result<Option<usize>> {
        let published = self.store.published();
        let target = match self.current {
            Some(i) => published
                .iter()
                .copied()
                .find(|&p| p > i)
                .or_else(|| published.first().copied()),
            None => published.first().copied(),
        };
        self.move_to(target)
    }

    /// Move to the previous loaded page, wrapping around.
    pub fn prev_page(&mut self) -> Result<Option<usize>> {
        let published = self.store.published();
        let target = match self.current {
            Some(i) => published
                .iter()
                .rev()
                .copied()
                .find(|&p| p < i)
                .or_else(|| published.last().copied()),
            None => published.last().copied(),
        };
        self.move_to(target)
    }

    fn move_to(&mut self, target: Option<usize>) -> Result<Option<usize>> {
        self.output.stop()?;
        if target.is_some() {
            self.current = target;
        }
        Ok(self.current)
    }

    /// Play an artifact of the current page.
    ///
    /// # Errors
    /// [`PagecastError::NotReady`] when no page is loaded, and
    /// [`PagecastError::Playback`] when the artifact has no audio (blank page).
    pub fn play(&mut self, artifact: Artifact) -> Result<Arc<PageRecord>> {
        self.artifact = artifact;
        let page = self
            .ensure_current()
            .ok_or(PagecastError::NotReady { page: 0 })?;
        let record = self.store.require(page)?;

        let audio = record.audio_of(artifact);
        if audio.is_empty() {
            return Err(PagecastError::Playback {
                message: format!("page {} has no {} to play", page + 1, artifact),
            });
        }
        self.output.play(audio)?;
        debug!(page, %artifact, bytes = audio.len(), "playing");
        Ok(record)
    }

    pub fn stop(&mut self) -> Result<()> {
        self.output.stop()
    }

    pub fn pause(&mut self) -> Result<()> {
        self.output.pause()
    }

    pub fn resume(&mut self) -> Result<()> {
        self.output.resume()
    }
}
