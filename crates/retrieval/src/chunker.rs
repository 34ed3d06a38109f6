//! Word-window chunking with configurable size and overlap.

use crate::error::{Result, RetrievalError};
use crate::types::{chunk_id, Chunk, Document};
use serde_json::Value;

/// Default words per chunk.
pub const DEFAULT_WINDOW_SIZE: usize = 500;

/// Default words shared by neighboring chunks.
pub const DEFAULT_OVERLAP: usize = 50;

/// Split `text` into overlapping windows of `window_size` words.
///
/// Words are whitespace-separated and re-joined with single spaces. Each
/// window starts `window_size - overlap` words after the previous one; the
/// last window may be shorter. Text without words yields no chunks.
///
/// # Errors
///
/// [`RetrievalError::InvalidArgument`] unless `window_size > 0` and
/// `overlap < window_size`.
///
/// # Example
/// ```
/// use scribe_retrieval::chunker::chunk;
///
/// let chunks = chunk("a b c d e", 3, 1).unwrap();
/// assert_eq!(chunks, vec!["a b c", "c d e"]);
/// ```
pub fn chunk(text: &str, window_size: usize, overlap: usize) -> Result<Vec<String>> {
    validate(window_size, overlap)?;

    let words: Vec<&str> = text.split_whitespace().collect();
    Ok(windows(&words, window_size, overlap)
        .map(|window| window.join(" "))
        .collect())
}

fn validate(window_size: usize, overlap: usize) -> Result<()> {
    if window_size == 0 {
        return Err(RetrievalError::InvalidArgument(
            "window size must be greater than zero".to_string(),
        ));
    }
    if overlap >= window_size {
        return Err(RetrievalError::InvalidArgument(format!(
            "overlap ({}) must be less than window size ({})",
            overlap, window_size
        )));
    }
    Ok(())
}

/// Iterate word windows. Parameters must already be validated.
fn windows<'a, 'w>(
    words: &'a [&'w str],
    window_size: usize,
    overlap: usize,
) -> impl Iterator<Item = &'a [&'w str]> {
    let step = window_size - overlap;
    let mut start = 0;
    let mut done = words.is_empty();

    std::iter::from_fn(move || {
        if done {
            return None;
        }
        let end = (start + window_size).min(words.len());
        let window = &words[start..end];
        if end == words.len() {
            done = true;
        } else {
            start += step;
        }
        Some(window)
    })
}

/// Validated chunking parameters, turning documents into [`Chunk`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    window_size: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a chunker, rejecting parameters that would not advance.
    pub fn new(window_size: usize, overlap: usize) -> Result<Self> {
        validate(window_size, overlap)?;
        Ok(Self {
            window_size,
            overlap,
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Chunk a document's text, deriving ids and metadata from the document.
    pub fn chunk_document(&self, document: &Document) -> Vec<Chunk> {
        let words: Vec<&str> = document.text.split_whitespace().collect();

        let chunks: Vec<Chunk> = windows(&words, self.window_size, self.overlap)
            .enumerate()
            .map(|(index, window)| {
                let mut metadata = document.metadata.clone();
                metadata.insert("documentId".to_string(), Value::from(document.id.as_str()));
                metadata.insert("title".to_string(), Value::from(document.title.as_str()));
                metadata.insert("chunkIndex".to_string(), Value::from(index));

                Chunk {
                    chunk_id: chunk_id(&document.id, index),
                    document_id: document.id.clone(),
                    index,
                    text: window.join(" "),
                    metadata,
                }
            })
            .collect();

        tracing::debug!(
            document_id = %document.id,
            words = words.len(),
            chunks = chunks.len(),
            window_size = self.window_size,
            overlap = self.overlap,
            "Chunked document"
        );

        chunks
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}
