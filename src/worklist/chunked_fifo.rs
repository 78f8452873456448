use crate::worklist::chunk::Chunk;
use crate::worklist::Worklist;
use crossbeam_utils::CachePadded;
use std::collections::VecDeque;
use std::mem;
use std::sync::Mutex;

/// A distributed chunked FIFO: the work-stealing baseline scheduler, and the
/// single logical bucket OBIM degenerates to when no indexer is given.
///
/// Each thread owns a push chunk and a pop chunk behind its own cache-padded
/// lock; full chunks move to a shared FIFO of chunks. A thread whose pop
/// chunk runs dry refills from the shared list, then drains its own push
/// buffer, then steals a whole chunk from another thread.
///
/// Lock order is always thread slot before shared list, and never more than
/// one thread slot at a time.
pub struct ChunkedFifo<T> {
    shared: Mutex<VecDeque<Chunk<T>>>,
    locals: Vec<CachePadded<Mutex<FifoLocal<T>>>>,
}

struct FifoLocal<T> {
    push: Chunk<T>,
    pop: Chunk<T>,
}

impl<T: Send> ChunkedFifo<T> {
    pub fn new(threads: usize) -> Self {
        Self {
            shared: Mutex::new(VecDeque::new()),
            locals: (0..threads)
                .map(|_| CachePadded::new(Mutex::new(FifoLocal { push: Chunk::new(), pop: Chunk::new() })))
                .collect(),
        }
    }

    fn steal(&self, thread_id: usize) -> Option<T> {
        for victim_id in 0..self.locals.len() {
            if victim_id == thread_id {
                continue;
            }
            let stolen = {
                let mut victim =
                    self.locals[victim_id].lock().expect("Fifo thread slot lock poisoned");
                if !victim.push.is_empty() {
                    Some(mem::take(&mut victim.push))
                } else if !victim.pop.is_empty() {
                    Some(mem::take(&mut victim.pop))
                } else {
                    None
                }
            };
            if let Some(chunk) = stolen {
                let mut local = self.locals[thread_id].lock().expect("Fifo thread slot lock poisoned");
                debug_assert!(local.pop.is_empty());
                local.pop = chunk;
                return local.pop.pop_front();
            }
        }
        None
    }
}

impl<T: Send> Worklist<T> for ChunkedFifo<T> {
    fn push(&self, thread_id: usize, item: T) {
        let mut local = self.locals[thread_id].lock().expect("Fifo thread slot lock poisoned");
        local.push.push_back(item);
        if local.push.is_full() {
            let full = mem::take(&mut local.push);
            drop(local);
            self.shared.lock().expect("Fifo shared list lock poisoned").push_back(full);
        }
    }

    fn pop(&self, thread_id: usize) -> Option<T> {
        {
            let mut local = self.locals[thread_id].lock().expect("Fifo thread slot lock poisoned");
            if let Some(item) = local.pop.pop_front() {
                return Some(item);
            }
        }

        let refill = self.shared.lock().expect("Fifo shared list lock poisoned").pop_front();
        if let Some(chunk) = refill {
            let mut local = self.locals[thread_id].lock().expect("Fifo thread slot lock poisoned");
            local.pop = chunk;
            if let Some(item) = local.pop.pop_front() {
                return Some(item);
            }
        }

        {
            let mut local = self.locals[thread_id].lock().expect("Fifo thread slot lock poisoned");
            if let Some(item) = local.push.pop_front() {
                return Some(item);
            }
        }

        self.steal(thread_id)
    }

    fn has_work(&self) -> bool {
        if !self.shared.lock().expect("Fifo shared list lock poisoned").is_empty() {
            return true;
        }
        self.locals.iter().any(|slot| {
            let local = slot.lock().expect("Fifo thread slot lock poisoned");
            !local.push.is_empty() || !local.pop.is_empty()
        })
    }
}
