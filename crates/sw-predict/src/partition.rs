use std::ops::Range;

/// One item of a subset, tagged with its position in that subset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkItem<T> {
    pub index: usize,
    pub item: T,
}

/// The contiguous run of items assigned to one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct Shard<T> {
    pub worker: usize,
    pub items: Vec<WorkItem<T>>,
}

impl<T> Shard<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Global indices covered by this shard.
    pub fn range(&self) -> Range<usize> {
        match (self.items.first(), self.items.last()) {
            (Some(first), Some(last)) => first.index..last.index + 1,
            _ => 0..0,
        }
    }
}

/// Split `items` into exactly `max(workers, 1)` contiguous shards.
///
/// Shard sizes differ by at most one; the first `len % workers` shards
/// take the extra item. Shards are empty when there are more workers than
/// items.
pub fn partition<T: Copy>(items: &[T], workers: usize) -> Vec<Shard<T>> {
    let workers = workers.max(1);
    let base = items.len() / workers;
    let extra = items.len() % workers;

    let mut shards = Vec::with_capacity(workers);
    let mut start = 0;
    for worker in 0..workers {
        let size = base + usize::from(worker < extra);
        let items = items[start..start + size]
            .iter()
            .enumerate()
            .map(|(offset, &item)| WorkItem {
                index: start + offset,
                item,
            })
            .collect();
        shards.push(Shard { worker, items });
        start += size;
    }
    shards
}
