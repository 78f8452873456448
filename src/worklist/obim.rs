use crate::worklist::chunk::Chunk;
use crate::worklist::{Indexer, Worklist};
use crossbeam_utils::CachePadded;
use hashbrown::HashMap;
use itertools::Itertools;
use std::collections::{BTreeMap, VecDeque};
use std::mem;
use std::sync::Mutex;

/// Ordered-by-integer-metric scheduler: an approximate priority queue keyed
/// by the indexer's bucket for each item.
///
/// Each thread buffers pushes in per-bucket chunks and drains one pop chunk
/// at a time, newest item first; full chunks publish into a shared ordered
/// map of active buckets. Priority is approximate: a worker keeps draining
/// its current chunk while another worker may already be on a lower bucket,
/// and items within a bucket are unordered. The bound on staleness is one
/// chunk.
///
/// Lock order is always thread slot before shared map, and never more than
/// one thread slot at a time.
pub struct Obim<T, I> {
    indexer: I,
    shared: Mutex<BTreeMap<u32, VecDeque<Chunk<T>>>>,
    locals: Vec<CachePadded<Mutex<ObimLocal<T>>>>,
}

struct ObimLocal<T> {
    /// Lowest bucket this thread has seen since it last fetched; pushes to
    /// a lower bucket pull the thread towards it on its next pop.
    current_bucket: u32,
    pop_bucket: u32,
    pop: Chunk<T>,
    push_bufs: HashMap<u32, Chunk<T>>,
}

impl<T: Send, I: Indexer<T> + Sync> Obim<T, I> {
    pub fn new(threads: usize, indexer: I) -> Self {
        Self {
            indexer,
            shared: Mutex::new(BTreeMap::new()),
            locals: (0..threads)
                .map(|_| {
                    CachePadded::new(Mutex::new(ObimLocal {
                        current_bucket: u32::MAX,
                        pop_bucket: u32::MAX,
                        pop: Chunk::new(),
                        push_bufs: HashMap::new(),
                    }))
                })
                .collect(),
        }
    }

    fn publish(&self, bucket: u32, chunk: Chunk<T>) {
        self.shared
            .lock()
            .expect("Obim shared map lock poisoned")
            .entry(bucket)
            .or_insert_with(VecDeque::new)
            .push_back(chunk);
    }

    /// Publishes every locally buffered chunk so idle threads can see them.
    fn flush_local(&self, thread_id: usize) {
        let buffered = {
            let mut local = self.locals[thread_id].lock().expect("Obim thread slot lock poisoned");
            if local.push_bufs.is_empty() {
                return;
            }
            local.push_bufs.drain().collect_vec()
        };
        let mut shared = self.shared.lock().expect("Obim shared map lock poisoned");
        for (bucket, chunk) in buffered {
            if !chunk.is_empty() {
                shared.entry(bucket).or_insert_with(VecDeque::new).push_back(chunk);
            }
        }
    }

    /// Pops one chunk from the globally lowest non-empty bucket.
    fn fetch_lowest(&self) -> Option<(u32, Chunk<T>)> {
        let mut shared = self.shared.lock().expect("Obim shared map lock poisoned");
        let bucket = *shared.keys().next()?;
        let queue = shared.get_mut(&bucket).expect("Bucket key just observed");
        let chunk = queue.pop_front().expect("Active buckets are never empty");
        if queue.is_empty() {
            shared.remove(&bucket);
        }
        Some((bucket, chunk))
    }

    fn adopt(&self, thread_id: usize, bucket: u32, chunk: Chunk<T>) -> Option<T> {
        let mut local = self.locals[thread_id].lock().expect("Obim thread slot lock poisoned");
        debug_assert!(local.pop.is_empty());
        local.pop = chunk;
        local.pop_bucket = bucket;
        local.current_bucket = bucket;
        local.pop.pop_back()
    }

    fn steal(&self, thread_id: usize) -> Option<T> {
        for victim_id in 0..self.locals.len() {
            if victim_id == thread_id {
                continue;
            }
            let stolen = {
                let mut victim =
                    self.locals[victim_id].lock().expect("Obim thread slot lock poisoned");
                if let Some(&bucket) = victim.push_bufs.keys().min() {
                    let chunk = victim.push_bufs.remove(&bucket).expect("Bucket key just observed");
                    Some((bucket, chunk))
                } else if !victim.pop.is_empty() {
                    let bucket = victim.pop_bucket;
                    Some((bucket, mem::take(&mut victim.pop)))
                } else {
                    None
                }
            };
            if let Some((bucket, chunk)) = stolen {
                return self.adopt(thread_id, bucket, chunk);
            }
        }
        None
    }
}

impl<T: Send, I: Indexer<T> + Sync> Worklist<T> for Obim<T, I> {
    fn push(&self, thread_id: usize, item: T) {
        let bucket = self.indexer.index(&item);
        let mut local = self.locals[thread_id].lock().expect("Obim thread slot lock poisoned");
        if bucket < local.current_bucket {
            local.current_bucket = bucket;
        }
        let buf = local.push_bufs.entry(bucket).or_insert_with(Chunk::new);
        buf.push_back(item);
        if buf.is_full() {
            let full = local.push_bufs.remove(&bucket).expect("Buffer entry just filled");
            drop(local);
            self.publish(bucket, full);
        }
    }

    fn pop(&self, thread_id: usize) -> Option<T> {
        {
            let mut local = self.locals[thread_id].lock().expect("Obim thread slot lock poisoned");
            // A push may have cached a bucket below the chunk being drained;
            // switch to it and put the stale chunk back.
            if local.current_bucket < local.pop_bucket {
                let lower = local.current_bucket;
                if let Some(chunk) = local.push_bufs.remove(&lower) {
                    let stale = mem::replace(&mut local.pop, chunk);
                    let stale_bucket = mem::replace(&mut local.pop_bucket, lower);
                    drop(local);
                    if !stale.is_empty() {
                        self.publish(stale_bucket, stale);
                    }
                    local = self.locals[thread_id].lock().expect("Obim thread slot lock poisoned");
                } else {
                    // The lower chunk was already published in full; the
                    // next fetch will find it.
                    local.current_bucket = local.pop_bucket;
                }
            }
            if let Some(item) = local.pop.pop_back() {
                return Some(item);
            }
        }

        self.flush_local(thread_id);
        if let Some((bucket, chunk)) = self.fetch_lowest() {
            return self.adopt(thread_id, bucket, chunk);
        }
        self.steal(thread_id)
    }

    fn has_work(&self) -> bool {
        if !self.shared.lock().expect("Obim shared map lock poisoned").is_empty() {
            return true;
        }
        self.locals.iter().any(|slot| {
            let local = slot.lock().expect("Obim thread slot lock poisoned");
            !local.pop.is_empty() || local.push_bufs.values().any(|buf| !buf.is_empty())
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::worklist::chunk::CHUNK_SIZE;
    use crate::worklist::obim::Obim;
    use crate::worklist::{Indexer, Worklist};
    use crossbeam_utils::thread;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ShiftIndexer {
        shift: u32,
    }

    impl Indexer<u32> for ShiftIndexer {
        fn index(&self, item: &u32) -> u32 {
            item >> self.shift
        }
    }

    #[test]
    fn single_thread_pops_buckets_in_order() {
        let obim = Obim::new(1, ShiftIndexer { shift: 4 });
        for value in [200_u32, 3, 70, 5, 100, 250, 17].iter() {
            obim.push(0, *value);
        }
        let mut buckets = Vec::new();
        while let Some(value) = obim.pop(0) {
            buckets.push(value >> 4);
        }
        let mut sorted = buckets.clone();
        sorted.sort_unstable();
        assert_eq!(buckets, sorted);
        assert!(!obim.has_work());
    }

    #[test]
    fn lower_bucket_push_preempts_current_chunk() {
        let obim = Obim::new(1, ShiftIndexer { shift: 4 });
        for value in 0..4 {
            obim.push(0, 240 + value);
        }
        assert_eq!(obim.pop(0).expect("Non-empty") >> 4, 15);
        // A lower-priority bucket arrives mid-drain; the next pop honors it.
        obim.push(0, 1);
        assert_eq!(obim.pop(0).expect("Non-empty"), 1);
        assert_eq!(obim.pop(0).expect("Non-empty") >> 4, 15);
    }

    #[test]
    fn concurrent_workers_drain_everything() {
        let threads = 4;
        let per_thread = 4 * CHUNK_SIZE + 13;
        let obim = Obim::new(threads, ShiftIndexer { shift: 6 });
        let popped = AtomicUsize::new(0);
        thread::scope(|s| {
            for thread_id in 0..threads {
                let obim = &obim;
                let popped = &popped;
                s.spawn(move |_| {
                    for value in 0..per_thread {
                        obim.push(thread_id, (value * 31) as u32);
                    }
                    while obim.pop(thread_id).is_some() {
                        popped.fetch_add(1, Ordering::Relaxed);
                    }
                });
            }
        })
        .expect("Error ending obim scope");
        let mut total = popped.load(Ordering::Relaxed);
        while obim.pop(0).is_some() {
            total += 1;
        }
        assert_eq!(total, threads * per_thread);
        assert!(!obim.has_work());
    }
}
