use crate::config::RunConfig;
use crate::engine::distance::DistanceArray;
use crate::stats::EngineStats;
use ds_engine_api::{Distance, GraphAccess, VertexId};
use std::collections::BTreeSet;

/// The serial baseline: an ordered set of update requests processed in
/// strict `(distance, vertex)` order. The parallel variants must reproduce
/// its output exactly.
pub fn run(graph: &impl GraphAccess, dist: &DistanceArray, config: &RunConfig, stats: &EngineStats) {
    let mut queue: BTreeSet<(Distance, VertexId)> = BTreeSet::new();
    queue.insert((0, config.start_vertex));

    while let Some(&(proposed, vertex)) = queue.iter().next() {
        queue.remove(&(proposed, vertex));
        stats.iterations.incr(0);
        if proposed >= dist.load(vertex) {
            continue;
        }
        dist.store(vertex, proposed);
        for (dst, weight) in graph.out_edges(vertex).iter() {
            let new_dist = proposed.saturating_add(weight);
            if new_dist < dist.load(dst) {
                queue.insert((new_dist, dst));
            }
        }
    }
}
