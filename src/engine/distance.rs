use crossbeam_utils::thread;
use ds_engine_api::{Distance, VertexId, DIST_INFINITY};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// The per-vertex distance cells. Reads and writes race freely; torn values
/// are impossible and the value is monotone non-increasing once the run
/// starts.
pub struct DistanceArray {
    cells: Vec<AtomicU32>,
}

impl DistanceArray {
    /// Allocates the cells and initializes every distance to the unreached
    /// sentinel, splitting the initialization across `threads` workers.
    pub fn infinite(len: usize, threads: usize) -> Self {
        let array = Self { cells: (0..len).map(|_| AtomicU32::new(0)).collect() };
        array.reset(threads);
        array
    }

    pub fn reset(&self, threads: usize) {
        let stride = (self.cells.len() + threads.max(1) - 1) / threads.max(1);
        thread::scope(|s| {
            for chunk in self.cells.chunks(stride.max(1)) {
                s.spawn(move |_| {
                    for cell in chunk {
                        cell.store(DIST_INFINITY, Ordering::Release);
                    }
                });
            }
        })
        .expect("Error ending distance init scope");
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline(always)]
    pub fn load(&self, vertex: VertexId) -> Distance {
        self.cells[vertex as usize].load(Ordering::Acquire)
    }

    #[inline(always)]
    pub fn store(&self, vertex: VertexId, dist: Distance) {
        self.cells[vertex as usize].store(dist, Ordering::Release);
    }

    /// Release on success so the subsequent push of the improved vertex
    /// happens-before the pop that observes it.
    #[inline(always)]
    pub fn compare_exchange(
        &self,
        vertex: VertexId,
        current: Distance,
        new: Distance,
    ) -> Result<Distance, Distance> {
        self.cells[vertex as usize].compare_exchange(
            current,
            new,
            Ordering::AcqRel,
            Ordering::Relaxed,
        )
    }

    pub fn to_vec(&self) -> Vec<Distance> {
        self.cells.iter().map(|cell| cell.load(Ordering::Acquire)).collect()
    }
}

/// Per-vertex spinlocks backing the non-CAS relaxation variants: the lock
/// holder's read-check-write on the destination cell is exclusive, which is
/// the invariant those variants rely on instead of compare-and-swap.
pub struct VertexLocks {
    locks: Vec<AtomicBool>,
}

impl VertexLocks {
    pub fn new(len: usize) -> Self {
        Self { locks: (0..len).map(|_| AtomicBool::new(false)).collect() }
    }

    #[inline(always)]
    pub fn lock(&self, vertex: VertexId) -> VertexGuard<'_> {
        let cell = &self.locks[vertex as usize];
        while cell.compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed).is_err()
        {
            std::hint::spin_loop();
        }
        VertexGuard { cell }
    }
}

pub struct VertexGuard<'a> {
    cell: &'a AtomicBool,
}

impl<'a> Drop for VertexGuard<'a> {
    fn drop(&mut self) {
        self.cell.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::distance::{DistanceArray, VertexLocks};
    use crossbeam_utils::thread;
    use ds_engine_api::DIST_INFINITY;

    #[test]
    fn starts_unreached() {
        let dist = DistanceArray::infinite(100, 4);
        assert_eq!(dist.len(), 100);
        assert!((0..100).all(|v| dist.load(v) == DIST_INFINITY));
    }

    #[test]
    fn cas_updates_once() {
        let dist = DistanceArray::infinite(1, 1);
        assert!(dist.compare_exchange(0, DIST_INFINITY, 7).is_ok());
        assert_eq!(dist.compare_exchange(0, DIST_INFINITY, 9), Err(7));
        assert_eq!(dist.load(0), 7);
    }

    #[test]
    fn vertex_lock_serializes_writers() {
        let locks = VertexLocks::new(1);
        let dist = DistanceArray::infinite(1, 1);
        dist.store(0, 0);
        thread::scope(|s| {
            for _ in 0..4 {
                let (locks, dist) = (&locks, &dist);
                s.spawn(move |_| {
                    for _ in 0..1_000 {
                        let _guard = locks.lock(0);
                        let old = dist.load(0);
                        dist.store(0, old + 1);
                    }
                });
            }
        })
        .expect("Error ending lock scope");
        assert_eq!(dist.load(0), 4_000);
    }
}
