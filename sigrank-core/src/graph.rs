//! Significance graph over model indices.
//!
//! An edge `a -> b` means model `a` performs significantly worse than model
//! `b`: the pair's p-value is at or below the medium threshold and `a` has
//! the lower average.

use serde::{Deserialize, Serialize};

use crate::result::PairwiseTestResult;

/// Directed graph stored as an arena of index adjacency lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignificanceGraph {
    successors: Vec<Vec<usize>>,
}

impl SignificanceGraph {
    pub fn new(vertex_count: usize) -> Self {
        Self {
            successors: vec![Vec::new(); vertex_count],
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.successors.len()
    }

    /// Add `from -> to`. Returns false for duplicates, self loops and
    /// out-of-range vertices.
    pub fn add_edge(&mut self, from: usize, to: usize) -> bool {
        let n = self.vertex_count();
        if from >= n || to >= n || from == to || self.successors[from].contains(&to) {
            return false;
        }
        self.successors[from].push(to);
        true
    }

    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        self.successors
            .get(from)
            .is_some_and(|succ| succ.contains(&to))
    }

    pub fn successors(&self, vertex: usize) -> &[usize] {
        self.successors.get(vertex).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn out_degree(&self, vertex: usize) -> usize {
        self.successors(vertex).len()
    }

    pub fn in_degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0; self.vertex_count()];
        for &to in self.successors.iter().flatten() {
            degrees[to] += 1;
        }
        degrees
    }

    pub fn edge_count(&self) -> usize {
        self.successors.iter().map(Vec::len).sum()
    }

    /// All edges, sorted.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<(usize, usize)> = self
            .successors
            .iter()
            .enumerate()
            .flat_map(|(from, succ)| succ.iter().map(move |&to| (from, to)))
            .collect();
        edges.sort_unstable();
        edges
    }
}

/// Build the significance graph from uncorrected post-hoc p-values.
///
/// One vertex per entry of `averages`. For every defined cell `(i, j)` with
/// `p <= threshold`, models `i + 1` and `j` are joined by an edge pointing
/// to the one with the higher average (ties point to `i + 1`). Failed (NaN)
/// and non-significant cells add nothing.
pub fn build_significance_graph(
    post_hoc: &PairwiseTestResult,
    averages: &[f64],
    threshold: f64,
) -> SignificanceGraph {
    let mut graph = SignificanceGraph::new(averages.len());

    for (i, j, _) in post_hoc.p_values.cells() {
        let Some(p) = post_hoc.p_values.get(i, j) else {
            continue;
        };
        if p > threshold {
            continue;
        }
        let (upper, lower) = (i + 1, j);
        if upper >= averages.len() {
            continue;
        }
        if averages[upper] < averages[lower] {
            graph.add_edge(upper, lower);
        } else {
            graph.add_edge(lower, upper);
        }
    }

    graph
}
