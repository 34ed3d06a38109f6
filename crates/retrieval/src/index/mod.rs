//! Vector index abstraction.
//!
//! An index maps chunk ids to embedding vectors and answers k-nearest
//! neighbor queries under cosine similarity. Scores are in `[-1.0, 1.0]`,
//! higher is better, and equal scores are ordered by insertion.

pub mod flat;
pub mod hnsw;

pub use flat::FlatIndex;
pub use hnsw::{HnswIndex, HnswParams};

use crate::config::IndexKind;
use crate::error::{Result, RetrievalError};
use std::cmp::Ordering;

/// Trait for vector index backends.
pub trait VectorIndex: Send + Sync + std::fmt::Debug {
    /// Append entries.
    ///
    /// The batch is validated as a whole before anything is inserted: an
    /// empty vector fails with [`RetrievalError::InvalidArgument`], a length
    /// differing from the index dimensionality (established by the first
    /// vector ever added) fails with [`RetrievalError::DimensionMismatch`].
    fn add(&mut self, entries: Vec<(String, Vec<f32>)>) -> Result<()>;

    /// Return up to `k` `(id, score)` pairs ordered best-first.
    ///
    /// An empty index yields an empty result for any query.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(String, f32)>>;

    /// Remove every entry and forget the dimensionality.
    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Established dimensionality, `None` until the first vector is added.
    fn dimensions(&self) -> Option<usize>;
}

/// Create an empty index of the given kind.
pub fn create_index(kind: IndexKind) -> Box<dyn VectorIndex> {
    match kind {
        IndexKind::Flat => Box::new(FlatIndex::new()),
        IndexKind::Hnsw => Box::new(HnswIndex::new(HnswParams::default())),
    }
}

/// Cosine similarity of two vectors. Zero when either has zero magnitude
/// or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    cosine_with_magnitudes(a, b, magnitude(a), magnitude(b))
}

pub(crate) fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

pub(crate) fn cosine_with_magnitudes(a: &[f32], b: &[f32], mag_a: f32, mag_b: f32) -> f32 {
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot / (mag_a * mag_b)
}

/// Check a batch against the current dimensionality and return the
/// dimensionality the index has after accepting it.
pub(crate) fn validate_batch(
    entries: &[(String, Vec<f32>)],
    current: Option<usize>,
) -> Result<Option<usize>> {
    let mut expected = current;
    for (id, vector) in entries {
        if vector.is_empty() {
            return Err(RetrievalError::InvalidArgument(format!(
                "empty embedding vector for '{}'",
                id
            )));
        }
        match expected {
            Some(dim) if dim != vector.len() => {
                return Err(RetrievalError::DimensionMismatch {
                    expected: dim,
                    actual: vector.len(),
                });
            }
            Some(_) => {}
            None => expected = Some(vector.len()),
        }
    }
    Ok(expected)
}

/// Check a query vector against the index dimensionality.
pub(crate) fn validate_query(query: &[f32], dimensions: Option<usize>) -> Result<()> {
    match dimensions {
        Some(dim) if dim != query.len() => Err(RetrievalError::DimensionMismatch {
            expected: dim,
            actual: query.len(),
        }),
        _ => Ok(()),
    }
}

/// Order by score descending, then by insertion sequence ascending.
pub(crate) fn rank(a: (f32, usize), b: (f32, usize)) -> Ordering {
    b.0.partial_cmp(&a.0)
        .unwrap_or(Ordering::Equal)
        .then(a.1.cmp(&b.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-2.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_ignores_magnitude() {
        let score = cosine_similarity(&[3.0, 4.0], &[0.6, 0.8]);
        assert!((score - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_validate_batch_checks_every_entry() {
        let batch = vec![
            ("a".to_string(), vec![1.0, 0.0]),
            ("b".to_string(), vec![1.0, 0.0, 0.0]),
        ];
        assert_eq!(
            validate_batch(&batch, None),
            Err(RetrievalError::DimensionMismatch { expected: 2, actual: 3 })
        );
        assert!(matches!(
            validate_batch(&[("c".to_string(), vec![])], Some(2)),
            Err(RetrievalError::InvalidArgument(_))
        ));
        assert_eq!(validate_batch(&[], Some(4)), Ok(Some(4)));
    }

    #[test]
    fn test_rank_breaks_ties_by_insertion() {
        let mut items = vec![(0.5, 2), (0.9, 3), (0.5, 0), (0.9, 1)];
        items.sort_by(|a, b| rank(*a, *b));
        assert_eq!(items, vec![(0.9, 1), (0.9, 3), (0.5, 0), (0.5, 2)]);
    }

    #[test]
    fn test_create_index_kinds() {
        assert!(create_index(IndexKind::Flat).is_empty());
        assert_eq!(create_index(IndexKind::Hnsw).dimensions(), None);
    }
}
