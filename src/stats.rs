//! Named work counters for the relaxation engine.
//!
//! Counters are sharded per worker thread into cache-padded cells so the hot
//! operator loop never shares a counter line between threads. Totals are
//! aggregated only at phase boundaries.

use crossbeam_utils::CachePadded;
use log::info;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct CountStat {
    name: &'static str,
    cells: Vec<CachePadded<AtomicU64>>,
}

impl CountStat {
    pub fn new(name: &'static str, threads: usize) -> Self {
        Self { name, cells: (0..threads).map(|_| CachePadded::new(AtomicU64::new(0))).collect() }
    }

    #[inline(always)]
    pub fn incr(&self, thread_id: usize) {
        self.cells[thread_id].fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn add(&self, thread_id: usize, count: u64) {
        self.cells[thread_id].fetch_add(count, Ordering::Relaxed);
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().map(|cell| cell.load(Ordering::Relaxed)).sum()
    }
}

/// The counters tracked across every algorithm variant.
pub struct EngineStats {
    pub iterations: CountStat,
    pub empty_work: CountStat,
    pub bad_work: CountStat,
}

impl EngineStats {
    pub fn new(threads: usize) -> Self {
        Self {
            iterations: CountStat::new("Iterations", threads),
            empty_work: CountStat::new("EmptyWork", threads),
            bad_work: CountStat::new("BadWork", threads),
        }
    }

    pub fn report(&self) {
        for stat in &[&self.iterations, &self.empty_work, &self.bad_work] {
            info!("STAT {} {}", stat.name(), stat.total());
        }
    }
}

/// Logs the engine counters when dropped, so the operator phase reports on
/// every exit path.
pub struct StatReporter<'a> {
    stats: &'a EngineStats,
}

impl<'a> StatReporter<'a> {
    pub fn new(stats: &'a EngineStats) -> Self {
        Self { stats }
    }
}

impl<'a> Drop for StatReporter<'a> {
    fn drop(&mut self) {
        self.stats.report();
    }
}

#[cfg(test)]
mod tests {
    use crate::stats::{CountStat, EngineStats};

    #[test]
    fn sharded_totals() {
        let stat = CountStat::new("Iterations", 4);
        stat.incr(0);
        stat.incr(3);
        stat.add(1, 40);
        assert_eq!(stat.total(), 42);
    }

    #[test]
    fn engine_stats_start_at_zero() {
        let stats = EngineStats::new(2);
        assert_eq!(stats.iterations.total(), 0);
        assert_eq!(stats.empty_work.total(), 0);
        assert_eq!(stats.bad_work.total(), 0);
    }
}
