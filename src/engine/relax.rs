use crate::engine::distance::{DistanceArray, VertexLocks};
use crate::stats::EngineStats;
use crate::worklist::Indexer;
use ds_engine_api::{Distance, EdgeWeight, GraphAccess, UpdateRequest, VertexId, DIST_INFINITY};

/// The relaxation operator, monomorphized over the update protocol: with
/// `USE_CAS` the destination cell is improved by a compare-and-swap retry
/// loop; without it the write happens under the destination's vertex lock.
/// The branch is a compile-time constant so the inner loop stays inlined.
pub struct RelaxEngine<'a, G, const USE_CAS: bool> {
    graph: &'a G,
    dist: &'a DistanceArray,
    locks: &'a VertexLocks,
    stats: &'a EngineStats,
}

impl<'a, G: GraphAccess, const USE_CAS: bool> RelaxEngine<'a, G, USE_CAS> {
    pub fn new(
        graph: &'a G,
        dist: &'a DistanceArray,
        locks: &'a VertexLocks,
        stats: &'a EngineStats,
    ) -> Self {
        Self { graph, dist, locks, stats }
    }

    pub fn graph(&self) -> &'a G {
        self.graph
    }

    pub fn dist(&self) -> &'a DistanceArray {
        self.dist
    }

    /// Attempts `dist[dst] = min(dist[dst], src_dist + weight)`; calls
    /// `on_improve` exactly once per strict improvement. Overflowing sums
    /// saturate to the unreached sentinel and relax nothing.
    #[inline(always)]
    pub fn relax_edge(
        &self,
        thread_id: usize,
        src_dist: Distance,
        dst: VertexId,
        weight: EdgeWeight,
        on_improve: &mut impl FnMut(VertexId, Distance),
    ) {
        let new_dist = src_dist.saturating_add(weight);
        if USE_CAS {
            let mut old_dist = self.dist.load(dst);
            while new_dist < old_dist {
                match self.dist.compare_exchange(dst, old_dist, new_dist) {
                    Ok(_) => {
                        if old_dist != DIST_INFINITY {
                            self.stats.bad_work.incr(thread_id);
                        }
                        on_improve(dst, new_dist);
                        break;
                    }
                    Err(current) => old_dist = current,
                }
            }
        } else {
            let _guard = self.locks.lock(dst);
            let old_dist = self.dist.load(dst);
            if new_dist < old_dist {
                self.dist.store(dst, new_dist);
                if old_dist != DIST_INFINITY {
                    self.stats.bad_work.incr(thread_id);
                }
                on_improve(dst, new_dist);
            }
        }
    }

    /// The request-carrying operator: the empty-work gate discards requests
    /// whose proposed distance has been superseded. Empty work is counted
    /// once per request at the gate; a mid-scan supersession stops the scan
    /// without recounting.
    pub fn relax_request(
        &self,
        thread_id: usize,
        req: UpdateRequest,
        on_improve: &mut impl FnMut(VertexId, Distance),
    ) {
        let src_dist = self.dist.load(req.vertex);
        if req.dist != src_dist {
            self.stats.empty_work.incr(thread_id);
            return;
        }
        for (dst, weight) in self.graph.out_edges(req.vertex).iter() {
            let src_dist = self.dist.load(req.vertex);
            if req.dist != src_dist {
                // Superseded mid-scan; the improving push rescans.
                break;
            }
            self.relax_edge(thread_id, src_dist, dst, weight, &mut *on_improve);
        }
    }

    /// The blind vertex operator used by the work-set variants: no gate, the
    /// source distance is re-read for every edge.
    pub fn relax_vertex(
        &self,
        thread_id: usize,
        vertex: VertexId,
        on_improve: &mut impl FnMut(VertexId),
    ) {
        for (dst, weight) in self.graph.out_edges(vertex).iter() {
            let src_dist = self.dist.load(vertex);
            self.relax_edge(thread_id, src_dist, dst, weight, &mut |improved, _| {
                on_improve(improved)
            });
        }
    }

    /// The push-pull operator: the push loop additionally folds in a pull
    /// phase that improves the scanned vertex from each non-relaxable
    /// neighbor. A pulled improvement is CAS-published and the vertex is
    /// re-enqueued so its out-edges rescan from the shorter distance; the
    /// strict decrease bounds the number of reissues. The pull treats the
    /// out-edge weight as the reverse weight, so it is exact only on
    /// symmetric graphs.
    pub fn relax_request_pull(
        &self,
        thread_id: usize,
        req: UpdateRequest,
        on_improve: &mut impl FnMut(VertexId, Distance),
    ) {
        let mut src_dist = self.dist.load(req.vertex);
        if req.dist != src_dist {
            self.stats.empty_work.incr(thread_id);
            return;
        }
        for (dst, weight) in self.graph.out_edges(req.vertex).iter() {
            let new_dist = src_dist.saturating_add(weight);
            let mut old_dist = self.dist.load(dst);
            if new_dist < old_dist {
                loop {
                    match self.dist.compare_exchange(dst, old_dist, new_dist) {
                        Ok(_) => {
                            if old_dist != DIST_INFINITY {
                                self.stats.bad_work.incr(thread_id);
                            }
                            on_improve(dst, new_dist);
                            break;
                        }
                        Err(current) => {
                            old_dist = current;
                            if new_dist >= old_dist {
                                break;
                            }
                        }
                    }
                }
            } else {
                src_dist = src_dist.min(old_dist.saturating_add(weight));
            }
        }
        let mut current = self.dist.load(req.vertex);
        while src_dist < current {
            match self.dist.compare_exchange(req.vertex, current, src_dist) {
                Ok(_) => {
                    on_improve(req.vertex, src_dist);
                    break;
                }
                Err(observed) => current = observed,
            }
        }
    }
}

/// Buckets a request by its proposed distance: `w >> delta`.
pub struct RequestIndexer {
    pub shift: u32,
}

impl Indexer<UpdateRequest> for RequestIndexer {
    #[inline(always)]
    fn index(&self, req: &UpdateRequest) -> u32 {
        req.dist >> self.shift
    }
}

/// Buckets a queued vertex by its current distance at push time:
/// `dist[v] >> delta`.
pub struct DistanceIndexer<'a> {
    dist: &'a DistanceArray,
    shift: u32,
}

impl<'a> DistanceIndexer<'a> {
    pub fn new(dist: &'a DistanceArray, shift: u32) -> Self {
        Self { dist, shift }
    }
}

impl<'a> Indexer<VertexId> for DistanceIndexer<'a> {
    #[inline(always)]
    fn index(&self, vertex: &VertexId) -> u32 {
        self.dist.load(*vertex) >> self.shift
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::distance::{DistanceArray, VertexLocks};
    use crate::engine::relax::{RelaxEngine, RequestIndexer};
    use crate::graph::CsrGraph;
    use crate::stats::EngineStats;
    use crate::worklist::Indexer;
    use ds_engine_api::{UpdateRequest, DIST_INFINITY};

    fn fixture() -> (CsrGraph, DistanceArray, VertexLocks, EngineStats) {
        let graph = CsrGraph::from_edges(3, &[(0, 1, 5), (0, 2, 9), (1, 2, 2)]).expect("Valid");
        (graph, DistanceArray::infinite(3, 1), VertexLocks::new(3), EngineStats::new(1))
    }

    #[test]
    fn relax_edge_improves_and_pushes_once() {
        let (graph, dist, locks, stats) = fixture();
        let engine = RelaxEngine::<_, true>::new(&graph, &dist, &locks, &stats);
        let mut pushed = Vec::new();
        engine.relax_edge(0, 0, 1, 5, &mut |v, d| pushed.push((v, d)));
        engine.relax_edge(0, 0, 1, 5, &mut |v, d| pushed.push((v, d)));
        assert_eq!(pushed, vec![(1, 5)]);
        assert_eq!(dist.load(1), 5);
        assert_eq!(stats.bad_work.total(), 0);
    }

    #[test]
    fn reimprovement_counts_bad_work() {
        let (graph, dist, locks, stats) = fixture();
        let engine = RelaxEngine::<_, true>::new(&graph, &dist, &locks, &stats);
        let mut pushed = Vec::new();
        engine.relax_edge(0, 0, 2, 9, &mut |v, d| pushed.push((v, d)));
        engine.relax_edge(0, 5, 2, 2, &mut |v, d| pushed.push((v, d)));
        assert_eq!(pushed, vec![(2, 9), (2, 7)]);
        assert_eq!(stats.bad_work.total(), 1);
    }

    #[test]
    fn overflow_saturates_without_relaxing() {
        let (graph, dist, locks, stats) = fixture();
        let engine = RelaxEngine::<_, true>::new(&graph, &dist, &locks, &stats);
        let mut pushed = Vec::new();
        engine.relax_edge(0, DIST_INFINITY - 1, 1, 100, &mut |v, d| pushed.push((v, d)));
        assert!(pushed.is_empty());
        assert_eq!(dist.load(1), DIST_INFINITY);
    }

    #[test]
    fn stale_request_is_empty_work() {
        let (graph, dist, locks, stats) = fixture();
        let engine = RelaxEngine::<_, true>::new(&graph, &dist, &locks, &stats);
        dist.store(0, 3);
        let mut pushed = Vec::new();
        engine.relax_request(0, UpdateRequest::new(0, 8), &mut |v, d| pushed.push((v, d)));
        assert!(pushed.is_empty());
        assert_eq!(stats.empty_work.total(), 1);

        engine.relax_request(0, UpdateRequest::new(0, 3), &mut |v, d| pushed.push((v, d)));
        assert_eq!(pushed, vec![(1, 8), (2, 12)]);
        assert_eq!(stats.empty_work.total(), 1);
    }

    #[test]
    fn locked_variant_matches_cas_variant() {
        let (graph, dist, locks, stats) = fixture();
        let engine = RelaxEngine::<_, false>::new(&graph, &dist, &locks, &stats);
        let mut pushed = Vec::new();
        dist.store(0, 0);
        engine.relax_vertex(0, 0, &mut |v| pushed.push(v));
        assert_eq!(pushed, vec![1, 2]);
        assert_eq!(dist.load(1), 5);
        assert_eq!(dist.load(2), 9);
    }

    #[test]
    fn pull_improves_scanned_vertex() {
        // Symmetric pair: 0 <-> 1 with weight 2; vertex 1 was reached with a
        // worse distance than the path back through 0 provides.
        let graph = CsrGraph::from_edges(2, &[(0, 1, 2), (1, 0, 2)]).expect("Valid");
        let dist = DistanceArray::infinite(2, 1);
        let locks = VertexLocks::new(2);
        let stats = EngineStats::new(1);
        let engine = RelaxEngine::<_, true>::new(&graph, &dist, &locks, &stats);
        dist.store(0, 0);
        dist.store(1, 10);
        let mut pushed = Vec::new();
        engine.relax_request_pull(0, UpdateRequest::new(1, 10), &mut |v, d| pushed.push((v, d)));
        // The pull found 0 + 2 < 10, published it, and requeued vertex 1.
        assert_eq!(dist.load(1), 2);
        assert_eq!(pushed, vec![(1, 2)]);
    }

    #[test]
    fn request_indexer_buckets_by_shift() {
        let indexer = RequestIndexer { shift: 3 };
        assert_eq!(indexer.index(&UpdateRequest::new(0, 7)), 0);
        assert_eq!(indexer.index(&UpdateRequest::new(0, 8)), 1);
        assert_eq!(indexer.index(&UpdateRequest::new(0, 65)), 8);
    }
}
