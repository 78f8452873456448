use crate::worklist::Worklist;
use crossbeam_utils::CachePadded;
use ds_engine_api::VertexId;
use hashbrown::HashSet;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Membership filter guaranteeing at most one queued token per vertex.
///
/// `try_insert` returns `false` when the vertex is already queued; the
/// wrapping work list then drops the push. A vertex may re-enter any time
/// after `remove`, which the wrapper calls on pop before the operator reads
/// the vertex's distance, so improvements observed during the edge scan can
/// re-enqueue it.
pub trait WorkSet: Sync {
    fn try_insert(&self, vertex: VertexId) -> bool;

    fn remove(&self, vertex: VertexId);
}

/// Marks queued vertices in a per-vertex atomic bit, one CAS per transition.
pub struct MarkingWorkSet {
    in_set: Vec<AtomicBool>,
}

impl MarkingWorkSet {
    pub fn new(vertex_count: usize) -> Self {
        Self { in_set: (0..vertex_count).map(|_| AtomicBool::new(false)).collect() }
    }
}

impl WorkSet for MarkingWorkSet {
    #[inline]
    fn try_insert(&self, vertex: VertexId) -> bool {
        self.in_set[vertex as usize]
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    fn remove(&self, vertex: VertexId) {
        self.in_set[vertex as usize].store(false, Ordering::Release);
    }
}

/// Tagged slots per first-level shard.
const SLOT_COUNT: usize = 1024;
/// Tag of a free slot; vertex ids stay below it.
const EMPTY_TAG: u32 = u32::MAX;

/// Two-level hash membership: the first level is one tagged-slot shard per
/// worker thread, claimed and released by compare-and-swap on the slot tag,
/// so the common insert and delete take no lock. One shared overflow table
/// absorbs vertices whose home slot is held by a colliding vertex.
///
/// The two levels are not checked atomically: a vertex spilled to the
/// overflow table can briefly hold a second token once its home slot frees
/// up. Each pop clears one location, and the blind operators tolerate the
/// extra rescan.
pub struct TwoLevelHashSet {
    shards: Vec<CachePadded<TagShard>>,
    overflow: Mutex<HashSet<VertexId>>,
}

struct TagShard {
    slots: Vec<AtomicU32>,
}

impl TwoLevelHashSet {
    pub fn new(workers: usize) -> Self {
        assert!(workers > 0);
        Self {
            shards: (0..workers)
                .map(|_| {
                    CachePadded::new(TagShard {
                        slots: (0..SLOT_COUNT).map(|_| AtomicU32::new(EMPTY_TAG)).collect(),
                    })
                })
                .collect(),
            overflow: Mutex::new(HashSet::new()),
        }
    }

    fn slot(&self, vertex: VertexId) -> &AtomicU32 {
        debug_assert!(vertex != EMPTY_TAG);
        let shard = vertex as usize % self.shards.len();
        let index = (vertex as usize / self.shards.len()) % SLOT_COUNT;
        &self.shards[shard].slots[index]
    }
}

impl WorkSet for TwoLevelHashSet {
    fn try_insert(&self, vertex: VertexId) -> bool {
        let slot = self.slot(vertex);
        let tag = slot.load(Ordering::Acquire);
        if tag == vertex {
            return false;
        }
        if tag == EMPTY_TAG {
            match slot.compare_exchange(EMPTY_TAG, vertex, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return true,
                Err(current) => {
                    if current == vertex {
                        return false;
                    }
                }
            }
        }
        // Home slot held by a colliding vertex; spill to the shared table.
        self.overflow.lock().expect("Overflow table lock poisoned").insert(vertex)
    }

    fn remove(&self, vertex: VertexId) {
        let slot = self.slot(vertex);
        if slot.compare_exchange(vertex, EMPTY_TAG, Ordering::AcqRel, Ordering::Relaxed).is_ok() {
            return;
        }
        self.overflow.lock().expect("Overflow table lock poisoned").remove(&vertex);
    }
}

/// Vertices a first-level ordered bucket holds before inserts spill over.
const BUCKET_CAPACITY: usize = 64;

/// Two-level ordered membership: the same shard-plus-overflow topology with
/// ordered buckets, for runs where a deterministic scan of queued vertices
/// matters. First-level buckets are bounded; one shared ordered overflow
/// set absorbs the excess. Inserts consult the overflow set only while it
/// is non-empty, so the common path stays on the per-worker bucket.
pub struct TwoLevelOrderedSet {
    shards: Vec<CachePadded<Mutex<BTreeSet<VertexId>>>>,
    overflow: Mutex<BTreeSet<VertexId>>,
    overflow_len: AtomicUsize,
}

impl TwoLevelOrderedSet {
    pub fn new(workers: usize) -> Self {
        assert!(workers > 0);
        Self {
            shards: (0..workers).map(|_| CachePadded::new(Mutex::new(BTreeSet::new()))).collect(),
            overflow: Mutex::new(BTreeSet::new()),
            overflow_len: AtomicUsize::new(0),
        }
    }

    fn bucket(&self, vertex: VertexId) -> &Mutex<BTreeSet<VertexId>> {
        &self.shards[vertex as usize % self.shards.len()]
    }
}

impl WorkSet for TwoLevelOrderedSet {
    fn try_insert(&self, vertex: VertexId) -> bool {
        let mut bucket = self.bucket(vertex).lock().expect("Ordered bucket lock poisoned");
        if bucket.contains(&vertex) {
            return false;
        }
        if bucket.len() < BUCKET_CAPACITY && self.overflow_len.load(Ordering::Acquire) == 0 {
            return bucket.insert(vertex);
        }
        // Lock order is bucket before overflow, everywhere.
        let mut overflow = self.overflow.lock().expect("Overflow set lock poisoned");
        if overflow.contains(&vertex) {
            return false;
        }
        if bucket.len() < BUCKET_CAPACITY {
            return bucket.insert(vertex);
        }
        overflow.insert(vertex);
        self.overflow_len.fetch_add(1, Ordering::Release);
        true
    }

    fn remove(&self, vertex: VertexId) {
        {
            let mut bucket = self.bucket(vertex).lock().expect("Ordered bucket lock poisoned");
            if bucket.remove(&vertex) {
                return;
            }
        }
        if self.overflow.lock().expect("Overflow set lock poisoned").remove(&vertex) {
            self.overflow_len.fetch_sub(1, Ordering::Release);
        }
    }
}

/// Wraps a vertex work list with a membership filter: duplicate pushes are
/// dropped silently, and membership is released on pop before the item
/// reaches the operator.
pub struct WorkSetWorklist<W, S> {
    inner: W,
    set: S,
}

impl<W: Worklist<VertexId>, S: WorkSet> WorkSetWorklist<W, S> {
    pub fn new(inner: W, set: S) -> Self {
        Self { inner, set }
    }
}

impl<W: Worklist<VertexId>, S: WorkSet> Worklist<VertexId> for WorkSetWorklist<W, S> {
    fn push(&self, thread_id: usize, vertex: VertexId) {
        if self.set.try_insert(vertex) {
            self.inner.push(thread_id, vertex);
        }
    }

    fn pop(&self, thread_id: usize) -> Option<VertexId> {
        let vertex = self.inner.pop(thread_id)?;
        self.set.remove(vertex);
        Some(vertex)
    }

    fn has_work(&self) -> bool {
        self.inner.has_work()
    }
}
