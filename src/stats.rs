use std::fmt;

/// A point-in-time snapshot of a queue's size and lifetime counters.
///
/// `size`, `enqueued_total − dequeued_total`, and the actual reachable-node
/// count only coincide at quiescent points; under concurrent load this is a
/// best-effort snapshot, not a consistency signal. The retry and total
/// counters are observational statistics and may wrap on overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStats {
    pub size: u64,
    pub max_size: u64,
    pub enqueued_total: u64,
    pub dequeued_total: u64,
    pub enqueue_retries: u64,
    pub dequeue_retries: u64,
}

impl fmt::Display for QueueStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "size={} max_size={} enqueued_total={} dequeued_total={} enqueue_retries={} dequeue_retries={}",
            self.size, self.max_size, self.enqueued_total, self.dequeued_total, self.enqueue_retries, self.dequeue_retries
        )
    }
}
