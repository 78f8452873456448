use crate::config::{Algo, RunConfig};
use crate::engine::run_sssp;
use crate::graph::generate::uniform_random;
use crate::graph::CsrGraph;
use ds_engine_api::{Distance, EdgeWeight, GraphAccess, VertexId, DIST_INFINITY};
use std::collections::VecDeque;

fn run(algo: Algo, graph: &CsrGraph, start: VertexId, delta: u32, threads: usize) -> Vec<Distance> {
    let config = RunConfig::new(algo, start, start, delta, threads, false);
    run_sssp(graph, &config).expect("Run should succeed").distances
}

/// Every parallel variant that is exact on directed graphs; the push-pull
/// operator assumes symmetric inputs and is exercised separately.
fn directed_algos() -> Vec<Algo> {
    use Algo::*;
    vec![
        Async,
        AsyncFifo,
        AsyncBlindObim,
        AsyncBlindFifo,
        AsyncBlindFifoHSet,
        AsyncBlindFifoMSet,
        AsyncBlindFifoOSet,
        AsyncBlindObimHSet,
        AsyncBlindObimMSet,
        AsyncBlindObimOSet,
        AsyncWithCas,
        AsyncWithCasFifo,
        AsyncWithCasBlindObim,
        AsyncWithCasBlindFifo,
        AsyncWithCasBlindFifoHSet,
        AsyncWithCasBlindFifoMSet,
        AsyncWithCasBlindFifoOSet,
        AsyncWithCasBlindObimHSet,
        AsyncWithCasBlindObimMSet,
        AsyncWithCasBlindObimOSet,
    ]
}

fn symmetric_random(
    vertex_count: VertexId,
    edge_count: usize,
    max_weight: EdgeWeight,
    seed: u64,
) -> CsrGraph {
    let base = uniform_random(vertex_count, edge_count, max_weight, seed).expect("Valid graph");
    let mut edges = Vec::with_capacity(2 * edge_count);
    for src in 0..vertex_count {
        for (dst, weight) in base.out_edges(src).iter() {
            edges.push((src, dst, weight));
            edges.push((dst, src, weight));
        }
    }
    CsrGraph::from_edges(vertex_count, &edges).expect("Valid graph")
}

fn reachable_from(graph: &CsrGraph, source: VertexId) -> Vec<bool> {
    let mut seen = vec![false; graph.vertex_count() as usize];
    let mut frontier = VecDeque::new();
    seen[source as usize] = true;
    frontier.push_back(source);
    while let Some(vertex) = frontier.pop_front() {
        for (dst, _) in graph.out_edges(vertex).iter() {
            if !seen[dst as usize] {
                seen[dst as usize] = true;
                frontier.push_back(dst);
            }
        }
    }
    seen
}

#[test]
fn source_only_graph() {
    let graph = CsrGraph::from_edges(1, &[]).expect("Valid graph");
    assert_eq!(run(Algo::Serial, &graph, 0, 10, 1), vec![0]);
    for algo in directed_algos() {
        assert_eq!(run(algo, &graph, 0, 10, 1), vec![0], "{:?}", algo);
    }
    assert_eq!(run(Algo::AsyncPP, &graph, 0, 10, 1), vec![0]);
}

#[test]
fn disconnected_components() {
    let graph = CsrGraph::from_edges(4, &[(0, 1, 5), (2, 3, 1)]).expect("Valid graph");
    let expected = vec![0, 5, DIST_INFINITY, DIST_INFINITY];
    assert_eq!(run(Algo::Serial, &graph, 0, 10, 1), expected);
    for algo in directed_algos() {
        assert_eq!(run(algo, &graph, 0, 10, 2), expected, "{:?}", algo);
    }
}

#[test]
fn chain_graph() {
    let graph = CsrGraph::from_edges(4, &[(0, 1, 2), (1, 2, 3), (2, 3, 4)]).expect("Valid graph");
    let expected = vec![0, 2, 5, 9];
    assert_eq!(run(Algo::Serial, &graph, 0, 10, 1), expected);
    for algo in directed_algos() {
        assert_eq!(run(algo, &graph, 0, 10, 2), expected, "{:?}", algo);
    }
}

#[test]
fn multiple_paths_tie_break() {
    let graph =
        CsrGraph::from_edges(4, &[(0, 1, 1), (0, 2, 4), (1, 2, 2), (2, 3, 1), (1, 3, 5)])
            .expect("Valid graph");
    let expected = vec![0, 1, 3, 4];
    assert_eq!(run(Algo::Serial, &graph, 0, 10, 1), expected);
    for algo in directed_algos() {
        assert_eq!(run(algo, &graph, 0, 10, 2), expected, "{:?}", algo);
    }
}

#[test]
fn delta_extremes_agree() {
    let graph = uniform_random(120, 700, 900, 7).expect("Valid graph");
    let coarse = run(Algo::AsyncWithCas, &graph, 0, 20, 2);
    let fine = run(Algo::AsyncWithCas, &graph, 0, 0, 2);
    assert_eq!(coarse, fine);
    assert_eq!(coarse, run(Algo::Serial, &graph, 0, 10, 1));
}

#[test]
fn all_variants_match_serial_on_random_graph() {
    let graph = uniform_random(200, 1_200, 500, 11).expect("Valid graph");
    let expected = run(Algo::Serial, &graph, 0, 10, 1);
    for algo in directed_algos() {
        assert_eq!(run(algo, &graph, 0, 10, 4), expected, "{:?}", algo);
    }
}

#[test]
fn push_pull_matches_serial_on_symmetric_graph() {
    let graph = symmetric_random(150, 600, 300, 13);
    let expected = run(Algo::Serial, &graph, 5, 10, 1);
    assert_eq!(run(Algo::AsyncPP, &graph, 5, 10, 1), expected);
    assert_eq!(run(Algo::AsyncPP, &graph, 5, 10, 4), expected);
}

#[test]
fn output_is_idempotent() {
    let graph = uniform_random(180, 900, 400, 17).expect("Valid graph");
    let first = run(Algo::AsyncWithCas, &graph, 3, 10, 4);
    let second = run(Algo::AsyncWithCas, &graph, 3, 10, 4);
    assert_eq!(first, second);
}

#[test]
fn reachability_agreement() {
    let graph = uniform_random(160, 500, 200, 23).expect("Valid graph");
    let distances = run(Algo::AsyncWithCasBlindObimMSet, &graph, 0, 10, 4);
    let reachable = reachable_from(&graph, 0);
    for (vertex, &seen) in reachable.iter().enumerate() {
        assert_eq!(distances[vertex] != DIST_INFINITY, seen, "vertex {}", vertex);
    }
}

#[test]
fn marking_set_coalesces_hub_pops() {
    // A funnel: the source fans out to `spokes` vertices whose weights
    // decrease in seed order, and every spoke feeds one sink. Processed in
    // FIFO order each spoke improves the sink again, so the blind variant
    // queues the sink once per improvement while the marking set keeps at
    // most one token live.
    let spokes: u32 = 10_000;
    let sink = spokes + 1;
    let mut edges = Vec::with_capacity(2 * spokes as usize);
    for index in 1..=spokes {
        edges.push((0, index, spokes + 1 - index));
        edges.push((index, sink, 1));
    }
    let graph = CsrGraph::from_edges(spokes + 2, &edges).expect("Valid graph");

    let run_counted = |algo: Algo| {
        let config = RunConfig::new(algo, 0, sink, 10, 1, false);
        run_sssp(&graph, &config).expect("Run should succeed")
    };

    let plain = run_counted(Algo::AsyncWithCasBlindFifo);
    let marking = run_counted(Algo::AsyncWithCasBlindFifoMSet);

    assert_eq!(plain.distances, marking.distances);
    assert_eq!(plain.report_distance, 2);
    assert!(
        marking.iterations < plain.iterations,
        "marking set should pop strictly less: {} vs {}",
        marking.iterations,
        plain.iterations
    );
}

#[test]
fn chain_has_no_bad_work_single_threaded() {
    let graph = CsrGraph::from_edges(4, &[(0, 1, 2), (1, 2, 3), (2, 3, 4)]).expect("Valid graph");
    let config = RunConfig::new(Algo::AsyncWithCas, 0, 3, 10, 1, false);
    let result = run_sssp(&graph, &config).expect("Run should succeed");
    assert_eq!(result.report_distance, 9);
    assert!(result.iterations > 0);
    assert_eq!(result.bad_work, 0);
}

#[test]
fn invalid_configurations_fail_fast() {
    let graph = CsrGraph::from_edges(2, &[(0, 1, 1)]).expect("Valid graph");
    let out_of_range_start = RunConfig::new(Algo::AsyncWithCas, 9, 0, 10, 1, false);
    assert!(run_sssp(&graph, &out_of_range_start).is_err());
    let out_of_range_report = RunConfig::new(Algo::AsyncWithCas, 0, 9, 10, 1, false);
    assert!(run_sssp(&graph, &out_of_range_report).is_err());
    let oversized_delta = RunConfig::new(Algo::AsyncWithCas, 0, 1, 32, 1, false);
    assert!(run_sssp(&graph, &oversized_delta).is_err());
    let zero_threads = RunConfig::new(Algo::AsyncWithCas, 0, 1, 10, 0, false);
    assert!(run_sssp(&graph, &zero_threads).is_err());
}
