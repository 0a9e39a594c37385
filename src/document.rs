//! Paginated document sources.
//!
//! A [`PageSource`] hands out the text of one page at a time. Page text is
//! produced outside this crate: PDFs are converted with an external tool such
//! as `pdftotext`, which separates pages with a form feed.

use crate::error::{PagecastError, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;

/// Page separator emitted by `pdftotext` and most text converters.
pub const PAGE_BREAK: char = '\x0c';

/// Trait for extracting page text from a document.
///
/// This trait allows swapping implementations (real documents vs mock).
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Extract the text of one page.
    ///
    /// # Errors
    /// Returns [`PagecastError::Extraction`] when the page is unreadable or
    /// the index is out of range.
    async fn extract_page_text(&self, page_index: usize) -> Result<String>;
}

fn out_of_range(page: usize, count: usize) -> PagecastError {
    PagecastError::Extraction {
        page,
        message: format!("page index out of range (document has {count} pages)"),
    }
}

/// Plain-text document whose pages are separated by form feeds.
#[derive(Debug, Clone)]
pub struct TextDocument {
    pages: Vec<String>,
}

impl TextDocument {
    /// Split text into pages on [`PAGE_BREAK`].
    ///
    /// A single trailing page break (as `pdftotext` writes after the last
    /// page) does not produce an extra empty page.
    pub fn from_text(text: &str) -> Self {
        let body = text.strip_suffix(PAGE_BREAK).unwrap_or(text);
        let pages = if body.is_empty() {
            Vec::new()
        } else {
            body.split(PAGE_BREAK).map(|p| p.trim().to_string()).collect()
        };
        Self { pages }
    }

    /// Read a document from disk.
    pub async fn open(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let text = String::from_utf8(bytes).map_err(|e| PagecastError::Extraction {
            page: 0,
            message: format!("{} is not valid UTF-8: {e}", path.display()),
        })?;
        Ok(Self::from_text(&text))
    }
}

#[async_trait]
impl PageSource for TextDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    async fn extract_page_text(&self, page_index: usize) -> Result<String> {
        self.pages
            .get(page_index)
            .cloned()
            .ok_or_else(|| out_of_range(page_index, self.pages.len()))
    }
}

/// Mock page source for testing
#[derive(Debug, Clone, Default)]
pub struct MockPageSource {
    pages: Vec<String>,
    failing: HashSet<usize>,
}

impl MockPageSource {
    /// Create a mock document with the given page texts
    pub fn new<S: Into<String>>(pages: impl IntoIterator<Item = S>) -> Self {
        Self {
            pages: pages.into_iter().map(Into::into).collect(),
            failing: HashSet::new(),
        }
    }

    /// Create a mock document of `count` pages with text "page N"
    pub fn numbered(count: usize) -> Self {
        Self::new((0..count).map(|i| format!("page {i}")))
    }

    /// Configure extraction of `page_index` to fail
    pub fn with_failing_page(mut self, page_index: usize) -> Self {
        self.failing.insert(page_index);
        self
    }
}

#[async_trait]
impl PageSource for MockPageSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    async fn extract_page_text(&self, page_index: usize) -> Result<String> {
        if self.failing.contains(&page_index) {
            return Err(PagecastError::Extraction {
                page: page_index,
                message: "mock extraction failure".to_string(),
            });
        }
        self.pages
            .get(page_index)
            .cloned()
            .ok_or_else(|| out_of_range(page_index, self.pages.len()))
    }
}
