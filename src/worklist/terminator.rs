use std::sync::atomic::{AtomicUsize, Ordering};

/// Distributed quiescence detection: a shared count of active workers plus a
/// re-check handshake.
///
/// A worker that runs out of work calls `try_idle` with a probe of the work
/// list's global visibility. The worker leaves the active count while it
/// spins; it either observes new work and re-activates, or observes the
/// count at zero — meaning every worker is idle, so no further pushes can
/// happen — re-probes once, and declares termination.
///
/// Workers publish locally buffered items before popping `None`, so an item
/// is never invisible to the probe while its producer is idle.
pub struct Terminator {
    active: AtomicUsize,
}

impl Terminator {
    pub fn new(workers: usize) -> Self {
        Self { active: AtomicUsize::new(workers) }
    }

    /// Returns `true` when the computation has globally terminated; `false`
    /// when new work appeared and the worker should resume popping.
    pub fn try_idle(&self, has_work: &dyn Fn() -> bool) -> bool {
        self.active.fetch_sub(1, Ordering::SeqCst);
        loop {
            if has_work() {
                self.active.fetch_add(1, Ordering::SeqCst);
                return false;
            }
            if self.active.load(Ordering::SeqCst) == 0 {
                // All workers idle: one final probe, then done.
                if has_work() {
                    self.active.fetch_add(1, Ordering::SeqCst);
                    return false;
                }
                return true;
            }
            std::thread::yield_now();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::worklist::terminator::Terminator;
    use crossbeam_utils::thread;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn single_worker_terminates() {
        let terminator = Terminator::new(1);
        assert!(terminator.try_idle(&|| false));
    }

    #[test]
    fn pending_work_resumes_worker() {
        let terminator = Terminator::new(1);
        assert!(!terminator.try_idle(&|| true));
        // The worker re-activated; draining the work then terminates.
        assert!(terminator.try_idle(&|| false));
    }

    #[test]
    fn all_workers_agree_on_termination() {
        let workers = 4;
        let terminator = Terminator::new(workers);
        let pending = AtomicUsize::new(100);
        thread::scope(|s| {
            for _ in 0..workers {
                s.spawn(|_| loop {
                    let claimed = pending
                        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                            count.checked_sub(1)
                        })
                        .is_ok();
                    if !claimed && terminator.try_idle(&|| pending.load(Ordering::SeqCst) > 0) {
                        break;
                    }
                });
            }
        })
        .expect("Error ending terminator scope");
        assert_eq!(pending.load(Ordering::SeqCst), 0);
    }
}
