//! HNSW (Hierarchical Navigable Small World) index.
//!
//! A multi-layer proximity graph: upper layers hold exponentially fewer
//! nodes and are searched greedily to find a good entry point, the bottom
//! layer holds every node and is searched with a bounded beam.
//!
//! Insert and search are O(log N) on average; memory is O(N * M).

use super::{cosine_with_magnitudes, magnitude, rank, validate_batch, validate_query, VectorIndex};
use crate::error::Result;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

const MAX_LEVEL: usize = 16;
const RNG_SEED: u64 = 42;

/// Graph construction and search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HnswParams {
    /// Max neighbors per node on upper layers (twice this on layer 0)
    pub m: usize,
    /// Beam width while inserting
    pub ef_construction: usize,
    /// Beam width while searching; raised to `k` when smaller
    pub ef_search: usize,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            m: 16,
            ef_construction: 200,
            ef_search: 64,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    id: String,
    vector: Vec<f32>,
    magnitude: f32,
    /// Neighbor lists for layers `0..=level`
    neighbors: Vec<Vec<usize>>,
}

/// Heap entry. Higher score wins; among equal scores the earlier insertion
/// wins, so heap order agrees with the final ranking.
#[derive(Debug, Clone, Copy)]
struct Scored {
    score: f32,
    node: usize,
}

impl PartialEq for Scored {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scored {}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Approximate nearest-neighbor index.
///
/// Node positions double as insertion sequence numbers. Level assignment
/// uses a fixed-seed LCG, so the same inserts always build the same graph.
#[derive(Debug, Clone)]
pub struct HnswIndex {
    params: HnswParams,
    m_max0: usize,
    level_mult: f64,
    nodes: Vec<Node>,
    entry_point: Option<usize>,
    top_level: usize,
    dimensions: Option<usize>,
    rng_state: u64,
}

impl HnswIndex {
    pub fn new(params: HnswParams) -> Self {
        let m = params.m.max(2);
        let params = HnswParams {
            m,
            ef_construction: params.ef_construction.max(1),
            ef_search: params.ef_search.max(1),
        };

        Self {
            params,
            m_max0: m * 2,
            level_mult: 1.0 / (m as f64).ln(),
            nodes: Vec::new(),
            entry_point: None,
            top_level: 0,
            dimensions: None,
            rng_state: RNG_SEED,
        }
    }

    fn insert(&mut self, id: String, vector: Vec<f32>) {
        let level = self.select_level();
        let idx = self.nodes.len();
        let query = vector.clone();
        let query_mag = magnitude(&vector);

        self.nodes.push(Node {
            id,
            magnitude: query_mag,
            vector,
            neighbors: vec![Vec::new(); level + 1],
        });

        let Some(mut ep) = self.entry_point else {
            self.entry_point = Some(idx);
            self.top_level = level;
            return;
        };

        // Greedy descent through layers above the new node's level.
        for layer in (level + 1..=self.top_level).rev() {
            ep = self.greedy_closest(ep, &query, query_mag, layer);
        }

        for layer in (0..=level.min(self.top_level)).rev() {
            let found = self.search_layer(ep, &query, query_mag, self.params.ef_construction, layer);
            let limit = if layer == 0 { self.m_max0 } else { self.params.m };

            let selected: Vec<usize> = found.iter().take(limit).map(|s| s.node).collect();
            for &neighbor in &selected {
                self.link(idx, neighbor, layer);
                self.link(neighbor, idx, layer);
                self.prune(neighbor, layer, limit);
            }

            if let Some(best) = found.first() {
                ep = best.node;
            }
        }

        if level > self.top_level {
            self.entry_point = Some(idx);
            self.top_level = level;
        }
    }

    /// Draw a level from an exponential distribution.
    fn select_level(&mut self) -> usize {
        self.rng_state = self
            .rng_state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1);
        let r = ((self.rng_state >> 33) as f64 / (1u64 << 31) as f64).max(1e-9);
        let level = (-r.ln() * self.level_mult).floor() as usize;
        level.min(MAX_LEVEL)
    }

    fn similarity(&self, node: usize, query: &[f32], query_mag: f32) -> f32 {
        let n = &self.nodes[node];
        cosine_with_magnitudes(&n.vector, query, n.magnitude, query_mag)
    }

    fn layer_neighbors(&self, node: usize, layer: usize) -> &[usize] {
        self.nodes[node]
            .neighbors
            .get(layer)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Follow the best neighbor on `layer` until no neighbor improves.
    fn greedy_closest(&self, entry: usize, query: &[f32], query_mag: f32, layer: usize) -> usize {
        let mut current = entry;
        let mut current_sim = self.similarity(current, query, query_mag);

        loop {
            let mut changed = false;
            for &neighbor in self.layer_neighbors(current, layer) {
                let sim = self.similarity(neighbor, query, query_mag);
                if sim > current_sim {
                    current = neighbor;
                    current_sim = sim;
                    changed = true;
                }
            }
            if !changed {
                return current;
            }
        }
    }

    /// Beam search on one layer. Returns up to `ef` nodes ranked best-first.
    fn search_layer(
        &self,
        entry: usize,
        query: &[f32],
        query_mag: f32,
        ef: usize,
        layer: usize,
    ) -> Vec<Scored> {
        let mut visited: HashSet<usize> = HashSet::new();
        // Max-heap: explore the most similar candidate first.
        let mut candidates: BinaryHeap<Scored> = BinaryHeap::new();
        // Min-heap: the worst kept result sits on top.
        let mut results: BinaryHeap<Reverse<Scored>> = BinaryHeap::new();

        let start = Scored {
            score: self.similarity(entry, query, query_mag),
            node: entry,
        };
        visited.insert(entry);
        candidates.push(start);
        results.push(Reverse(start));

        while let Some(candidate) = candidates.pop() {
            if let Some(Reverse(worst)) = results.peek() {
                if results.len() >= ef && candidate < *worst {
                    break;
                }
            }

            for &neighbor in self.layer_neighbors(candidate.node, layer) {
                if !visited.insert(neighbor) {
                    continue;
                }

                let scored = Scored {
                    score: self.similarity(neighbor, query, query_mag),
                    node: neighbor,
                };
                let admit = match results.peek() {
                    Some(Reverse(worst)) => results.len() < ef || scored > *worst,
                    None => true,
                };
                if admit {
                    candidates.push(scored);
                    results.push(Reverse(scored));
                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        let mut ranked: Vec<Scored> = results.into_iter().map(|Reverse(s)| s).collect();
        ranked.sort_by(|a, b| b.cmp(a));
        ranked
    }

    fn link(&mut self, from: usize, to: usize, layer: usize) {
        if let Some(list) = self.nodes[from].neighbors.get_mut(layer) {
            if !list.contains(&to) {
                list.push(to);
            }
        }
    }

    /// Keep only the `max` most similar neighbors of `node` on `layer`.
    fn prune(&mut self, node: usize, layer: usize, max: usize) {
        let neighbors = self.layer_neighbors(node, layer);
        if neighbors.len() <= max {
            return;
        }

        let base = &self.nodes[node];
        let mut scored: Vec<(f32, usize)> = neighbors
            .iter()
            .map(|&n| (self.similarity(n, &base.vector, base.magnitude), n))
            .collect();
        scored.sort_by(|a, b| rank(*a, *b));
        scored.truncate(max);

        self.nodes[node].neighbors[layer] = scored.into_iter().map(|(_, n)| n).collect();
    }
}

impl Default for HnswIndex {
    fn default() -> Self {
        Self::new(HnswParams::default())
    }
}

impl VectorIndex for HnswIndex {
    fn add(&mut self, entries: Vec<(String, Vec<f32>)>) -> Result<()> {
        self.dimensions = validate_batch(&entries, self.dimensions)?;
        for (id, vector) in entries {
            self.insert(id, vector);
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(String, f32)>> {
        let Some(mut ep) = self.entry_point else {
            return Ok(Vec::new());
        };
        if k == 0 {
            return Ok(Vec::new());
        }
        validate_query(query, self.dimensions)?;

        let query_mag = magnitude(query);
        for layer in (1..=self.top_level).rev() {
            ep = self.greedy_closest(ep, query, query_mag, layer);
        }

        let ef = self.params.ef_search.max(k);
        Ok(self
            .search_layer(ep, query, query_mag, ef, 0)
            .into_iter()
            .take(k)
            .map(|s| (self.nodes[s.node].id.clone(), s.score))
            .collect())
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.entry_point = None;
        self.top_level = 0;
        self.dimensions = None;
        self.rng_state = RNG_SEED;
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }
}
