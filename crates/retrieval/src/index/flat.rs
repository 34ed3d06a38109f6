//! Exact brute-force index.

use super::{cosine_with_magnitudes, magnitude, rank, validate_batch, validate_query, VectorIndex};
use crate::error::Result;

#[derive(Debug, Clone)]
struct Entry {
    id: String,
    vector: Vec<f32>,
    magnitude: f32,
}

/// Scans every entry on each search. Exact, and fast enough for a single
/// notebook's worth of chunks.
#[derive(Debug, Clone, Default)]
pub struct FlatIndex {
    entries: Vec<Entry>,
    dimensions: Option<usize>,
}

impl FlatIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VectorIndex for FlatIndex {
    fn add(&mut self, entries: Vec<(String, Vec<f32>)>) -> Result<()> {
        self.dimensions = validate_batch(&entries, self.dimensions)?;
        self.entries.extend(entries.into_iter().map(|(id, vector)| Entry {
            magnitude: magnitude(&vector),
            id,
            vector,
        }));
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(String, f32)>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        validate_query(query, self.dimensions)?;

        let query_mag = magnitude(query);
        let mut scored: Vec<(f32, usize)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(seq, entry)| {
                (
                    cosine_with_magnitudes(&entry.vector, query, entry.magnitude, query_mag),
                    seq,
                )
            })
            .collect();
        scored.sort_by(|a, b| rank(*a, *b));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, seq)| (self.entries[seq].id.clone(), score))
            .collect())
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.dimensions = None;
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }
}
