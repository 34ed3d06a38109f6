//! Offline embedder built from hashed character trigrams.

use crate::embeddings::provider::Embedder;
use crate::error::Result;
use std::collections::HashMap;

/// Words too common to say anything about a passage.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "did", "do", "does", "for", "from",
    "had", "has", "have", "how", "in", "is", "it", "its", "of", "on", "or", "that", "the",
    "their", "them", "they", "this", "to", "was", "were", "what", "when", "where", "which", "who",
    "why", "with",
];

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Deterministic, content-dependent embeddings without a model.
///
/// Each significant word contributes its whole-word hash and the hashes of
/// its character trigrams to a fixed number of buckets; the result is
/// L2-normalized. Texts sharing vocabulary score high under cosine
/// similarity, which is enough for local use and tests.
#[derive(Debug, Clone)]
pub struct TrigramEmbedder {
    dimensions: usize,
}

impl TrigramEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        if self.dimensions == 0 {
            return vector;
        }

        let mut counts: HashMap<String, usize> = HashMap::new();
        for word in significant_words(text) {
            *counts.entry(word).or_default() += 1;
        }

        for (word, count) in &counts {
            let weight = (*count as f32).sqrt();

            // Pad so short words still produce a trigram.
            let padded: Vec<char> = format!(" {} ", word).chars().collect();
            for gram in padded.windows(3) {
                let gram: String = gram.iter().collect();
                vector[self.bucket(&gram)] += weight;
            }

            vector[self.bucket(word)] += *count as f32;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }

    fn bucket(&self, token: &str) -> usize {
        (fnv1a(token) % self.dimensions as u64) as usize
    }
}

/// Lowercased words with punctuation stripped and stop words removed.
fn significant_words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|raw| {
            raw.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty() && !STOP_WORDS.contains(&word.as_str()))
}

fn fnv1a(token: &str) -> u64 {
    token
        .bytes()
        .fold(FNV_OFFSET, |hash, b| (hash ^ b as u64).wrapping_mul(FNV_PRIME))
}

#[async_trait::async_trait]
impl Embedder for TrigramEmbedder {
    fn name(&self) -> &str {
        "trigram"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }
}
