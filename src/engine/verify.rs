use crate::error::{verify_error, DeltaSurgeError};
use crossbeam_utils::thread;
use ds_engine_api::{Distance, EdgeWeight, GraphAccess, VertexId, DIST_INFINITY};
use itertools::Itertools;
use log::{info, warn};

#[derive(Default)]
struct RangeSummary {
    unreached: usize,
    max_dist: Distance,
    violation: Option<(VertexId, VertexId, EdgeWeight)>,
}

/// Post-run check: the source is pinned at zero and no edge is still
/// relaxable. Unreached vertices are reported but are not an error.
pub fn verify(
    graph: &impl GraphAccess,
    distances: &[Distance],
    source: VertexId,
    threads: usize,
) -> Result<(), DeltaSurgeError> {
    if distances[source as usize] != 0 {
        return Err(verify_error(format!(
            "Source vertex {} has non-zero distance {}",
            source, distances[source as usize]
        )));
    }

    let stride = (distances.len() + threads - 1) / threads;
    let summaries = thread::scope(|s| {
        let handles = (0..threads)
            .map(|thread_id| {
                let start = (thread_id * stride).min(distances.len());
                let end = ((thread_id + 1) * stride).min(distances.len());
                s.spawn(move |_| scan_range(graph, distances, start, end))
            })
            .collect_vec();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("Error joining verify thread"))
            .collect_vec()
    })
    .expect("Error ending verify scope");

    let mut unreached = 0;
    let mut max_dist = 0;
    let mut violation = None;
    for summary in summaries {
        unreached += summary.unreached;
        max_dist = max_dist.max(summary.max_dist);
        violation = violation.or(summary.violation);
    }

    if let Some((src, dst, weight)) = violation {
        return Err(verify_error(format!(
            "Edge ({} -> {}, weight {}) is still relaxable: {} + {} < {}",
            src, dst, weight, distances[src as usize], weight, distances[dst as usize]
        )));
    }
    if unreached > 0 {
        warn!("{} vertices not reached from source {}", unreached, source);
    }
    info!("Max distance: {}", max_dist);
    Ok(())
}

fn scan_range(
    graph: &impl GraphAccess,
    distances: &[Distance],
    start: usize,
    end: usize,
) -> RangeSummary {
    let mut summary = RangeSummary::default();
    for vertex in start..end {
        let dist = distances[vertex];
        if dist == DIST_INFINITY {
            summary.unreached += 1;
            continue;
        }
        summary.max_dist = summary.max_dist.max(dist);
        for (dst, weight) in graph.out_edges(vertex as VertexId).iter() {
            if distances[dst as usize] > dist.saturating_add(weight) {
                summary.violation.get_or_insert((vertex as VertexId, dst, weight));
            }
        }
    }
    summary
}
