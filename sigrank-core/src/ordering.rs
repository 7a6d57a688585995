//! Level-based topological ordering of a significance graph.
//!
//! Level 0 holds the models nothing is significantly worse than; each
//! following level holds the models that become free once every earlier
//! level is removed. An ordering is only accepted when every model of a
//! level has an edge to every model of every later level.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::graph::SignificanceGraph;

/// Why no ordering could be derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderRejection {
    /// The graph contains a cycle.
    Cyclic,
    /// Some level does not fully dominate the levels after it.
    IncompleteDominance,
}

/// Level map or the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum LevelOrder {
    Valid(BTreeMap<usize, BTreeSet<usize>>),
    Rejected(OrderRejection),
}

impl LevelOrder {
    pub fn levels(&self) -> Option<&BTreeMap<usize, BTreeSet<usize>>> {
        match self {
            LevelOrder::Valid(levels) => Some(levels),
            LevelOrder::Rejected(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, LevelOrder::Valid(_))
    }
}

/// Ordering of one measure and branch, with the edges it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOrdering {
    pub order: LevelOrder,
    pub edges: Vec<(usize, usize)>,
}

impl ModelOrdering {
    pub fn from_graph(graph: &SignificanceGraph) -> Self {
        Self {
            order: order_models(graph),
            edges: graph.edges(),
        }
    }
}

/// Level-synchronous Kahn's algorithm.
///
/// Vertices freed while a level is processed join the next level, never
/// the current one. Each level is sorted by vertex index.
pub fn topological_levels(graph: &SignificanceGraph) -> Result<Vec<Vec<usize>>, OrderRejection> {
    let mut remaining = graph.in_degrees();
    let mut current: Vec<usize> = (0..graph.vertex_count())
        .filter(|&v| remaining[v] == 0)
        .collect();

    let mut levels = Vec::new();
    let mut processed = 0;
    while !current.is_empty() {
        let mut next = Vec::new();
        for &vertex in &current {
            for &succ in graph.successors(vertex) {
                remaining[succ] -= 1;
                if remaining[succ] == 0 {
                    next.push(succ);
                }
            }
        }
        next.sort_unstable();
        processed += current.len();
        levels.push(std::mem::replace(&mut current, next));
    }

    if processed < graph.vertex_count() {
        return Err(OrderRejection::Cyclic);
    }
    Ok(levels)
}

/// Check that every vertex of every level but the last has an edge to all
/// vertices of the later levels.
pub fn levels_fully_dominate(graph: &SignificanceGraph, levels: &[Vec<usize>]) -> bool {
    let mut remaining = graph.vertex_count();
    let Some((_, head)) = levels.split_last() else {
        return true;
    };
    for level in head {
        remaining -= level.len();
        if level.iter().any(|&v| graph.out_degree(v) != remaining) {
            return false;
        }
    }
    true
}

/// Topologically level `graph` and validate the result.
pub fn order_models(graph: &SignificanceGraph) -> LevelOrder {
    let levels = match topological_levels(graph) {
        Ok(levels) => levels,
        Err(rejection) => return LevelOrder::Rejected(rejection),
    };
    if !levels_fully_dominate(graph, &levels) {
        return LevelOrder::Rejected(OrderRejection::IncompleteDominance);
    }
    LevelOrder::Valid(
        levels
            .into_iter()
            .enumerate()
            .map(|(level, vertices)| (level, vertices.into_iter().collect()))
            .collect(),
    )
}
