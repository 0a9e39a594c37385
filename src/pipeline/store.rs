//! Shared, write-once store of finished pages.

use crate::error::{PagecastError, Result};
use crate::pipeline::types::PageRecord;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// What a reader sees for a page index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    /// Published and complete.
    Ready(Arc<PageRecord>),
    /// Not processed (yet).
    NotReady,
    /// Its job failed; stays unavailable for the rest of the run.
    Failed(String),
}

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<usize, Arc<PageRecord>>,
    failures: HashMap<usize, String>,
}

/// Page records keyed by page index.
///
/// Cloning yields another handle to the same store. Every write is a single
/// insert-if-absent under the lock, and readers go through the same lock, so
/// a record is either fully visible or absent.
#[derive(Debug, Clone, Default)]
pub struct PageStore {
    inner: Arc<RwLock<Inner>>,
}

impl PageStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A poisoned lock still holds consistent data: writers never panic
    // between checking and inserting.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish a finished page.
    ///
    /// # Errors
    /// Returns [`PagecastError::PublishConflict`] if the page was already
    /// published; the existing record is left untouched.
    pub fn publish(&self, record: PageRecord) -> Result<Arc<PageRecord>> {
        let page = record.page_index;
        let mut inner = self.write();
        if inner.records.contains_key(&page) {
            return Err(PagecastError::PublishConflict { page });
        }
        let record = Arc::new(record);
        inner.records.insert(page, Arc::clone(&record));
        inner.failures.remove(&page);
        Ok(record)
    }

    /// Remember why a page could not be produced.
    ///
    /// Ignored for pages that are already published.
    pub fn record_failure(&self, page_index: usize, reason: impl Into<String>) {
        let mut inner = self.write();
        if !inner.records.contains_key(&page_index) {
            inner.failures.insert(page_index, reason.into());
        }
    }

    pub fn status(&self, page_index: usize) -> PageStatus {
        let inner = self.read();
        if let Some(record) = inner.records.get(&page_index) {
            PageStatus::Ready(Arc::clone(record))
        } else if let Some(reason) = inner.failures.get(&page_index) {
            PageStatus::Failed(reason.clone())
        } else {
            PageStatus::NotReady
        }
    }

    /// The published record, or `None` while the page is not ready.
    pub fn get(&self, page_index: usize) -> Option<Arc<PageRecord>> {
        self.read().records.get(&page_index).cloned()
    }

    /// Like [`get`](Self::get), but as an error for callers that need the page.
    pub fn require(&self, page_index: usize) -> Result<Arc<PageRecord>> {
        self.get(page_index)
            .ok_or(PagecastError::NotReady { page: page_index })
    }

    /// Failure reason of a page whose job failed.
    pub fn failure(&self, page_index: usize) -> Option<String> {
        self.read().failures.get(&page_index).cloned()
    }

    /// Number of published pages.
    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Indices of published pages, ascending.
    pub fn published(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.read().records.keys().copied().collect();
        indices.sort_unstable();
        indices
    }

    /// Failed pages and their reasons, by ascending index.
    pub fn failures(&self) -> Vec<(usize, String)> {
        let mut failures: Vec<(usize, String)> = self
            .read()
            .failures
            .iter()
            .map(|(i, r)| (*i, r.clone()))
            .collect();
        failures.sort_unstable_by_key(|(i, _)| *i);
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn record(page_index: usize, text: &str) -> PageRecord {
        PageRecord {
            page_index,
            text: text.to_string(),
            summary: String::new(),
            interpretation: String::new(),
            text_audio: text.as_bytes().to_vec(),
            summary_audio: Vec::new(),
            interpretation_audio: Vec::new(),
        }
    }

    #[test]
    fn test_unpublished_page_is_not_ready() {
        let store = PageStore::new();
        assert_eq!(store.status(4), PageStatus::NotReady);
        assert!(store.get(4).is_none());
        assert!(matches!(
            store.require(4),
            Err(PagecastError::NotReady { page: 4 })
        ));
    }

    #[test]
    fn test_publish_then_read() {
        let store = PageStore::new();
        store.publish(record(0, "hello")).unwrap();

        let got = store.get(0).unwrap();
        assert_eq!(got.text, "hello");
        assert!(matches!(store.status(0), PageStatus::Ready(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_empty_content_is_distinct_from_not_ready() {
        let store = PageStore::new();
        store.publish(record(1, "")).unwrap();

        match store.status(1) {
            PageStatus::Ready(r) => assert!(r.text.is_empty()),
            other => panic!("Expected Ready, got {:?}", other),
        }
    }

    #[test]
    fn test_double_publish_is_conflict() {
        let store = PageStore::new();
        store.publish(record(3, "first")).unwrap();

        let err = store.publish(record(3, "second")).unwrap_err();
        assert!(matches!(err, PagecastError::PublishConflict { page: 3 }));
        assert!(err.is_fatal());
        assert_eq!(store.get(3).unwrap().text, "first");
    }

    #[test]
    fn test_failure_is_reported_and_cleared_by_publish() {
        let store = PageStore::new();
        store.record_failure(2, "speech service error");

        assert_eq!(
            store.status(2),
            PageStatus::Failed("speech service error".to_string())
        );
        assert!(store.get(2).is_none());
        assert_eq!(store.failures(), vec![(2, "speech service error".to_string())]);

        store.publish(record(2, "retry")).unwrap();
        assert!(store.failure(2).is_none());
    }

    #[test]
    fn test_failure_does_not_shadow_published_record() {
        let store = PageStore::new();
        store.publish(record(0, "ok")).unwrap();
        store.record_failure(0, "late failure");
        assert!(matches!(store.status(0), PageStatus::Ready(_)));
    }

    #[test]
    fn test_concurrent_publish_loses_no_updates() {
        let store = PageStore::new();
        let threads = 8;
        let per_thread = 250;

        thread::scope(|scope| {
            for t in 0..threads {
                let store = store.clone();
                scope.spawn(move || {
                    for i in 0..per_thread {
                        let page = t * per_thread + i;
                        store.publish(record(page, "x")).unwrap();
                    }
                });
            }
        });

        assert_eq!(store.len(), threads * per_thread);
        assert_eq!(store.published(), (0..threads * per_thread).collect::<Vec<_>>());
    }

    #[test]
    fn test_concurrent_publish_of_same_page_has_one_winner() {
        let store = PageStore::new();

        let results: Vec<bool> = thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    let store = store.clone();
                    scope.spawn(move || store.publish(record(9, "race")).is_ok())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|ok| **ok).count(), 1);
        assert_eq!(store.len(), 1);
    }
}
