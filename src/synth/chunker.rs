//! Bounded-length text splitting.

use std::iter::FusedIterator;

/// Lazy iterator over consecutive pieces of a string.
///
/// Every piece holds at most `max_len` characters and pieces are cut on
/// char boundaries, so concatenating them yields the input exactly.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: &'a str,
    max_len: usize,
}

/// Split `text` into pieces of at most `max_len` characters.
///
/// Empty text yields no pieces.
///
/// # Panics
/// Panics if `max_len` is 0.
pub fn split(text: &str, max_len: usize) -> Chunks<'_> {
    assert!(max_len > 0, "chunk length must be positive");
    Chunks {
        rest: text,
        max_len,
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let cut = self
            .rest
            .char_indices()
            .nth(self.max_len)
            .map(|(i, _)| i)
            .unwrap_or(self.rest.len());
        let (piece, rest) = self.rest.split_at(cut);
        self.rest = rest;
        Some(piece)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.rest.chars().count().div_ceil(self.max_len);
        (n, Some(n))
    }
}

impl ExactSizeIterator for Chunks<'_> {}

impl FusedIterator for Chunks<'_> {}
