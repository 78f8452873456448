use crate::config::{Algo, RunConfig, SchedulerKind, WorkSetKind};
use crate::engine::distance::{DistanceArray, VertexLocks};
use crate::engine::relax::{DistanceIndexer, RelaxEngine, RequestIndexer};
use crate::engine::{serial, verify};
use crate::error::DeltaSurgeError;
use crate::stats::{EngineStats, StatReporter};
use crate::util::timer::{PhaseTime, PhaseTimer};
use crate::worklist::bag::InsertBag;
use crate::worklist::chunked_fifo::ChunkedFifo;
use crate::worklist::obim::Obim;
use crate::worklist::terminator::Terminator;
use crate::worklist::workset::{
    MarkingWorkSet, TwoLevelHashSet, TwoLevelOrderedSet, WorkSetWorklist,
};
use crate::worklist::Worklist;
use crossbeam_utils::thread;
use ds_engine_api::{Distance, GraphAccess, UpdateRequest, VertexId};
use log::info;
use psutil::process::os::linux::ProcessExt;

pub struct SsspResult {
    pub distances: Vec<Distance>,
    pub report_distance: Distance,
    pub operator_time: PhaseTime,
    pub iterations: u64,
    pub empty_work: u64,
    pub bad_work: u64,
}

/// Resident-set snapshot bracketing the operator phase: the delta is the
/// cost of the distance cells, vertex locks, and live scheduler chunks.
#[allow(clippy::cast_precision_loss)]
fn report_resident_memory(when: &str) {
    const BYTES_IN_MB: f64 = 1024_f64 * 1024_f64;
    let process = psutil::process::Process::new(std::process::id()).expect("Error getting process");
    let statm = process.procfs_statm().expect("Error reading process memory");
    info!("Resident memory {} relaxation: {:.1} MB", when, statm.resident as f64 / BYTES_IN_MB);
}

/// Runs the configured algorithm to completion: initialize distances, seed
/// the frontier from the source's out-edges, drain the scheduler to
/// quiescence, then verify.
pub fn run_sssp<G: GraphAccess>(
    graph: &G,
    config: &RunConfig,
) -> Result<SsspResult, DeltaSurgeError> {
    config.validate(graph)?;
    info!(
        "Running {:?} with {} threads and delta-step of {}",
        config.algo,
        config.threads,
        1_u32 << config.delta_shift
    );

    let stats = EngineStats::new(config.threads);
    let dist = DistanceArray::infinite(graph.vertex_count() as usize, config.threads);

    report_resident_memory("before");
    let timer = PhaseTimer::start();
    {
        let _reporter = StatReporter::new(&stats);
        match config.algo {
            Algo::Serial => serial::run(graph, &dist, config, &stats),
            Algo::AsyncPP => run_push_pull(graph, &dist, config, &stats),
            algo if algo.is_blind() => {
                if algo.uses_cas() {
                    run_blind::<G, true>(graph, &dist, config, &stats);
                } else {
                    run_blind::<G, false>(graph, &dist, config, &stats);
                }
            }
            algo => {
                if algo.uses_cas() {
                    run_requests::<G, true>(graph, &dist, config, &stats);
                } else {
                    run_requests::<G, false>(graph, &dist, config, &stats);
                }
            }
        }
    }
    let operator_time = timer.stop();
    info!(
        "Operator phase finished in {} ({})",
        operator_time.seconds_string(),
        operator_time.rate_string(stats.iterations.total())
    );
    report_resident_memory("after");

    let distances = dist.to_vec();
    if !config.skip_verify {
        verify::verify(graph, &distances, config.start_vertex, config.threads)?;
        info!("Verification successful");
    }
    let report_distance = distances[config.report_vertex as usize];
    info!("Vertex {} has distance {}", config.report_vertex, report_distance);
    Ok(SsspResult {
        distances,
        report_distance,
        operator_time,
        iterations: stats.iterations.total(),
        empty_work: stats.empty_work.total(),
        bad_work: stats.bad_work.total(),
    })
}

/// The request-carrying variants: OBIM bucketed by the proposed distance, or
/// the plain chunked FIFO.
fn run_requests<G: GraphAccess, const USE_CAS: bool>(
    graph: &G,
    dist: &DistanceArray,
    config: &RunConfig,
    stats: &EngineStats,
) {
    let locks = VertexLocks::new(if USE_CAS { 0 } else { dist.len() });
    let engine = RelaxEngine::<G, USE_CAS>::new(graph, dist, &locks, stats);
    let initial = seed_requests(&engine, config);
    match config.algo.scheduler() {
        SchedulerKind::Fifo => {
            let worklist = ChunkedFifo::new(config.threads);
            request_loop(&engine, &worklist, initial, config, stats);
        }
        SchedulerKind::Obim => {
            let worklist =
                Obim::new(config.threads, RequestIndexer { shift: config.delta_shift });
            request_loop(&engine, &worklist, initial, config, stats);
        }
    }
}

/// The blind vertex-carrying variants, optionally behind a work-set.
fn run_blind<G: GraphAccess, const USE_CAS: bool>(
    graph: &G,
    dist: &DistanceArray,
    config: &RunConfig,
    stats: &EngineStats,
) {
    let locks = VertexLocks::new(if USE_CAS { 0 } else { dist.len() });
    let engine = RelaxEngine::<G, USE_CAS>::new(graph, dist, &locks, stats);
    let initial = seed_vertices(&engine, config);
    let threads = config.threads;
    let vertex_count = dist.len();
    match (config.algo.scheduler(), config.algo.work_set()) {
        (SchedulerKind::Fifo, WorkSetKind::None) => {
            vertex_loop(&engine, &ChunkedFifo::new(threads), initial, config, stats);
        }
        (SchedulerKind::Fifo, WorkSetKind::Marking) => {
            let worklist =
                WorkSetWorklist::new(ChunkedFifo::new(threads), MarkingWorkSet::new(vertex_count));
            vertex_loop(&engine, &worklist, initial, config, stats);
        }
        (SchedulerKind::Fifo, WorkSetKind::Hash) => {
            let worklist =
                WorkSetWorklist::new(ChunkedFifo::new(threads), TwoLevelHashSet::new(threads));
            vertex_loop(&engine, &worklist, initial, config, stats);
        }
        (SchedulerKind::Fifo, WorkSetKind::Ordered) => {
            let worklist =
                WorkSetWorklist::new(ChunkedFifo::new(threads), TwoLevelOrderedSet::new(threads));
            vertex_loop(&engine, &worklist, initial, config, stats);
        }
        (SchedulerKind::Obim, WorkSetKind::None) => {
            let worklist =
                Obim::new(threads, DistanceIndexer::new(dist, config.delta_shift));
            vertex_loop(&engine, &worklist, initial, config, stats);
        }
        (SchedulerKind::Obim, WorkSetKind::Marking) => {
            let worklist = WorkSetWorklist::new(
                Obim::new(threads, DistanceIndexer::new(dist, config.delta_shift)),
                MarkingWorkSet::new(vertex_count),
            );
            vertex_loop(&engine, &worklist, initial, config, stats);
        }
        (SchedulerKind::Obim, WorkSetKind::Hash) => {
            let worklist = WorkSetWorklist::new(
                Obim::new(threads, DistanceIndexer::new(dist, config.delta_shift)),
                TwoLevelHashSet::new(threads),
            );
            vertex_loop(&engine, &worklist, initial, config, stats);
        }
        (SchedulerKind::Obim, WorkSetKind::Ordered) => {
            let worklist = WorkSetWorklist::new(
                Obim::new(threads, DistanceIndexer::new(dist, config.delta_shift)),
                TwoLevelOrderedSet::new(threads),
            );
            vertex_loop(&engine, &worklist, initial, config, stats);
        }
    }
}

fn run_push_pull<G: GraphAccess>(
    graph: &G,
    dist: &DistanceArray,
    config: &RunConfig,
    stats: &EngineStats,
) {
    let locks = VertexLocks::new(0);
    let engine = RelaxEngine::<G, true>::new(graph, dist, &locks, stats);
    let initial = seed_requests(&engine, config);
    let worklist = Obim::new(config.threads, RequestIndexer { shift: config.delta_shift });
    let terminator = Terminator::new(config.threads);
    thread::scope(|s| {
        for thread_id in 0..config.threads {
            let (engine, worklist, terminator) = (&engine, &worklist, &terminator);
            s.spawn(move |_| loop {
                match worklist.pop(thread_id) {
                    Some(req) => {
                        stats.iterations.incr(thread_id);
                        engine.relax_request_pull(thread_id, req, &mut |vertex, new_dist| {
                            worklist.push(thread_id, UpdateRequest::new(vertex, new_dist))
                        });
                    }
                    None => {
                        if terminator.try_idle(&|| worklist.has_work()) {
                            break;
                        }
                    }
                }
            });
        }
    })
    .expect("Error ending operator scope");
}

/// Seeds the initial frontier: the source's out-edges are relaxed in
/// parallel into an append-only bag.
fn seed_requests<G: GraphAccess, const USE_CAS: bool>(
    engine: &RelaxEngine<'_, G, USE_CAS>,
    config: &RunConfig,
) -> Vec<UpdateRequest> {
    engine.dist().store(config.start_vertex, 0);
    let edges = engine.graph().out_edges(config.start_vertex);
    let bag = InsertBag::new(config.threads);
    let stride = (edges.len() + config.threads - 1) / config.threads;
    thread::scope(|s| {
        for thread_id in 0..config.threads {
            let bag = &bag;
            let start = (thread_id * stride).min(edges.len());
            let end = ((thread_id + 1) * stride).min(edges.len());
            s.spawn(move |_| {
                for index in start..end {
                    engine.relax_edge(
                        thread_id,
                        0,
                        edges.dsts[index],
                        edges.weights[index],
                        &mut |vertex, dist| bag.push(thread_id, UpdateRequest::new(vertex, dist)),
                    );
                }
            });
        }
    })
    .expect("Error ending seed scope");
    bag.into_vec()
}

fn seed_vertices<G: GraphAccess, const USE_CAS: bool>(
    engine: &RelaxEngine<'_, G, USE_CAS>,
    config: &RunConfig,
) -> Vec<VertexId> {
    engine.dist().store(config.start_vertex, 0);
    let edges = engine.graph().out_edges(config.start_vertex);
    let bag = InsertBag::new(config.threads);
    let stride = (edges.len() + config.threads - 1) / config.threads;
    thread::scope(|s| {
        for thread_id in 0..config.threads {
            let bag = &bag;
            let start = (thread_id * stride).min(edges.len());
            let end = ((thread_id + 1) * stride).min(edges.len());
            s.spawn(move |_| {
                for index in start..end {
                    engine.relax_edge(
                        thread_id,
                        0,
                        edges.dsts[index],
                        edges.weights[index],
                        &mut |vertex, _| bag.push(thread_id, vertex),
                    );
                }
            });
        }
    })
    .expect("Error ending seed scope");
    bag.into_vec()
}

/// One worker loop per thread: `pop -> operator -> pop` until the
/// termination handshake declares the structure empty.
fn request_loop<G: GraphAccess, const USE_CAS: bool, W: Worklist<UpdateRequest>>(
    engine: &RelaxEngine<'_, G, USE_CAS>,
    worklist: &W,
    initial: Vec<UpdateRequest>,
    config: &RunConfig,
    stats: &EngineStats,
) {
    for (index, req) in initial.into_iter().enumerate() {
        worklist.push(index % config.threads, req);
    }
    let terminator = Terminator::new(config.threads);
    thread::scope(|s| {
        for thread_id in 0..config.threads {
            let terminator = &terminator;
            s.spawn(move |_| loop {
                match worklist.pop(thread_id) {
                    Some(req) => {
                        stats.iterations.incr(thread_id);
                        engine.relax_request(thread_id, req, &mut |vertex, new_dist| {
                            worklist.push(thread_id, UpdateRequest::new(vertex, new_dist))
                        });
                    }
                    None => {
                        if terminator.try_idle(&|| worklist.has_work()) {
                            break;
                        }
                    }
                }
            });
        }
    })
    .expect("Error ending operator scope");
}

fn vertex_loop<G: GraphAccess, const USE_CAS: bool, W: Worklist<VertexId>>(
    engine: &RelaxEngine<'_, G, USE_CAS>,
    worklist: &W,
    initial: Vec<VertexId>,
    config: &RunConfig,
    stats: &EngineStats,
) {
    for (index, vertex) in initial.into_iter().enumerate() {
        worklist.push(index % config.threads, vertex);
    }
    let terminator = Terminator::new(config.threads);
    thread::scope(|s| {
        for thread_id in 0..config.threads {
            let terminator = &terminator;
            s.spawn(move |_| loop {
                match worklist.pop(thread_id) {
                    Some(vertex) => {
                        stats.iterations.incr(thread_id);
                        engine.relax_vertex(thread_id, vertex, &mut |improved| {
                            worklist.push(thread_id, improved)
                        });
                    }
                    None => {
                        if terminator.try_idle(&|| worklist.has_work()) {
                            break;
                        }
                    }
                }
            });
        }
    })
    .expect("Error ending operator scope");
}
