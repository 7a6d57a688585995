//! Criterion benchmarks for graph construction and leveling.
//!
//! Benchmarks:
//! 1. Significance graph construction from an all-pairs p-value matrix
//! 2. Level ordering of a fully dominating layered graph
//! 3. Level ordering of a graph that fails the dominance check
//! 4. p-value adjustment over a flattened matrix

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use sigrank_core::engine::adjust::adjust_p_values;
use sigrank_core::{
    build_significance_graph, order_models, CorrectionMethod, PairwiseTestResult,
    SignificanceGraph, TriangularMatrix,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_averages(n: usize) -> Vec<f64> {
    (0..n).map(|i| 0.5 + (i as f64 * 0.37).sin() * 0.2).collect()
}

fn make_post_hoc(n: usize) -> PairwiseTestResult {
    let rows = (1..n)
        .map(|i| (0..i).map(|j| ((i * 31 + j * 17) % 100) as f64 / 1000.0).collect())
        .collect();
    let p_values = TriangularMatrix::from_rows(rows);
    PairwiseTestResult::new("bench", p_values.clone(), p_values, true)
}

/// `groups` groups of `size` models, each group dominating all later ones.
fn make_layered(groups: usize, size: usize) -> SignificanceGraph {
    let n = groups * size;
    let mut graph = SignificanceGraph::new(n);
    for from in 0..n {
        for to in (from / size + 1) * size..n {
            graph.add_edge(from, to);
        }
    }
    graph
}

// ── 1. Graph Construction ────────────────────────────────────────────

fn bench_graph_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_build");
    for n in [10, 50, 200] {
        let averages = make_averages(n);
        let post_hoc = make_post_hoc(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| build_significance_graph(black_box(&post_hoc), black_box(&averages), 0.05))
        });
    }
    group.finish();
}

// ── 2-3. Ordering ────────────────────────────────────────────────────

fn bench_ordering(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_models");
    for groups in [5, 20, 50] {
        let graph = make_layered(groups, 4);
        group.bench_with_input(BenchmarkId::new("layered", groups * 4), &graph, |b, g| {
            b.iter(|| order_models(black_box(g)))
        });
    }
    for n in [50, 200] {
        let graph = build_significance_graph(&make_post_hoc(n), &make_averages(n), 0.05);
        group.bench_with_input(BenchmarkId::new("random", n), &graph, |b, g| {
            b.iter(|| order_models(black_box(g)))
        });
    }
    group.finish();
}

// ── 4. Adjustment ────────────────────────────────────────────────────

fn bench_adjust(c: &mut Criterion) {
    let flat = make_post_hoc(100).p_values.flatten();
    let mut group = c.benchmark_group("adjust_p_values");
    for method in CorrectionMethod::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(method), &method, |b, &m| {
            b.iter(|| adjust_p_values(black_box(&flat), m))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_graph_build, bench_ordering, bench_adjust);
criterion_main!(benches);
