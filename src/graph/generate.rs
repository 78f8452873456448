//! Seeded random graph generation for benchmarks and stress tests.

use crate::error::DeltaSurgeError;
use crate::graph::CsrGraph;
use ds_engine_api::{EdgeWeight, VertexId};
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A uniform random directed graph with `edge_count` edges and weights drawn
/// from `1..=max_weight`. The same seed always produces the same graph.
pub fn uniform_random(
    vertex_count: VertexId,
    edge_count: usize,
    max_weight: EdgeWeight,
    seed: u64,
) -> Result<CsrGraph, DeltaSurgeError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let edges = (0..edge_count)
        .map(|_| {
            (
                rng.gen_range(0..vertex_count),
                rng.gen_range(0..vertex_count),
                rng.gen_range(1..=max_weight),
            )
        })
        .collect_vec();
    CsrGraph::from_edges(vertex_count, &edges)
}
