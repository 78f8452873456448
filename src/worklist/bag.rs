use crossbeam_utils::CachePadded;
use std::sync::Mutex;

/// A multi-producer append-only container used to collect the initial
/// frontier: each producer appends to its own cache-padded segment, and the
/// single consumer drains all segments once producers are done.
pub struct InsertBag<T> {
    segments: Vec<CachePadded<Mutex<Vec<T>>>>,
}

impl<T> InsertBag<T> {
    pub fn new(producers: usize) -> Self {
        Self { segments: (0..producers).map(|_| CachePadded::new(Mutex::new(Vec::new()))).collect() }
    }

    pub fn push(&self, thread_id: usize, item: T) {
        self.segments[thread_id].lock().expect("Bag segment lock poisoned").push(item);
    }

    pub fn len(&self) -> usize {
        self.segments
            .iter()
            .map(|segment| segment.lock().expect("Bag segment lock poisoned").len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_vec(self) -> Vec<T> {
        let mut items = Vec::new();
        for segment in self.segments {
            items.append(&mut segment.into_inner().into_inner().expect("Bag segment lock poisoned"));
        }
        items
    }
}
