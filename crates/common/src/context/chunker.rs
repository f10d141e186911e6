//! Word-window chunking
//!
//! Splits a document into overlapping windows of whitespace-separated words
//! so every window fits inside a QA model's context limit.

use crate::config::ChunkingConfig;
use crate::errors::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A window of consecutive document words, re-joined with single spaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of this window in the sequence
    pub index: usize,
    /// First word of the window (inclusive)
    pub start_word: usize,
    /// One past the last word of the window
    pub end_word: usize,
    /// The window text
    pub text: String,
}

impl Chunk {
    pub fn word_count(&self) -> usize {
        self.end_word - self.start_word
    }
}

impl AsRef<str> for Chunk {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// Lazy sequence of windows over a document.
///
/// Windows start at word 0 and advance by `max_tokens - stride` words.
/// Iteration stops once a window has reached the last word, so a trailing
/// window that would only repeat the tail of its predecessor is never
/// produced.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    words: Vec<&'a str>,
    window: usize,
    step: usize,
    next_start: usize,
    next_index: usize,
    done: bool,
}

impl<'a> Chunks<'a> {
    fn new(text: &'a str, window: usize, step: usize) -> Self {
        let words: Vec<&str> = text.split_whitespace().collect();
        let done = words.is_empty();
        Self {
            words,
            window,
            step,
            next_start: 0,
            next_index: 0,
            done,
        }
    }

    /// Number of words in the underlying document
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    fn remaining(&self) -> usize {
        if self.done {
            return 0;
        }
        let left = self.words.len() - self.next_start;
        if left <= self.window {
            1
        } else {
            1 + (left - self.window).div_ceil(self.step)
        }
    }
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.done {
            return None;
        }

        let start = self.next_start;
        let end = (start + self.window).min(self.words.len());
        let chunk = Chunk {
            index: self.next_index,
            start_word: start,
            end_word: end,
            text: self.words[start..end].join(" "),
        };

        self.next_index += 1;
        self.next_start = start + self.step;
        self.done = end == self.words.len() || self.next_start >= self.words.len();

        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Chunks<'_> {}

impl std::iter::FusedIterator for Chunks<'_> {}

/// Split `text` into windows of `max_tokens` words overlapping by `stride`.
///
/// Fails with `InvalidConfiguration` before producing anything when the
/// window would not advance (`stride >= max_tokens` or `max_tokens == 0`).
/// Empty or whitespace-only text yields no chunks.
pub fn chunk(text: &str, max_tokens: usize, stride: usize) -> Result<Chunks<'_>> {
    chunk_with(text, &ChunkingConfig { max_tokens, stride })
}

/// [`chunk`] driven by a [`ChunkingConfig`]
pub fn chunk_with<'a>(text: &'a str, config: &ChunkingConfig) -> Result<Chunks<'a>> {
    let step = config.step()?;
    let chunks = Chunks::new(text, config.max_tokens, step);

    debug!(
        word_count = chunks.word_count(),
        chunk_count = chunks.len(),
        max_tokens = config.max_tokens,
        stride = config.stride,
        "Document chunked"
    );

    Ok(chunks)
}
