use std::mem::MaybeUninit;
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::epoch::{self, Atomic, Owned, Shared};
use crossbeam::utils::CachePadded;
use tracing::{debug, trace};

use crate::error::{DequeueError, EnqueueError};
use crate::node::Node;
use crate::stats::QueueStats;

/// A lock-free, multi-producer multi-consumer FIFO queue.
///
/// `HEAD` and `TAIL` are permanent sentinel nodes allocated at construction
/// and never move for the queue's lifetime; live payload nodes are spliced
/// in strictly between them. The queue is generic over its payload type so
/// the splice/advance algorithm stays provably payload-agnostic; the bundled
/// [`ByteQueue`] alias is the byte-buffer facade most callers want.
pub struct ConcurrentQueue<T> {
    head: CachePadded<Atomic<Node<T>>>,
    tail: CachePadded<Atomic<Node<T>>>,
    size: AtomicU64,
    max_size: AtomicU64,
    enqueued_total: AtomicU64,
    dequeued_total: AtomicU64,
    enqueue_retries: AtomicU64,
    dequeue_retries: AtomicU64,
}

// The payload is only ever observed by one thread at a time (the enqueuer
// until publication, the dequeuer that wins the claim afterwards), so `Send`
// on `T` is enough; the queue never hands out `&T` to more than one thread.
unsafe impl<T: Send> Send for ConcurrentQueue<T> {}
unsafe impl<T: Send> Sync for ConcurrentQueue<T> {}

/// The byte-buffer specialization most callers want: a queue of owned,
/// variable-length, possibly-empty payloads.
pub type ByteQueue = ConcurrentQueue<Vec<u8>>;

impl<T: Send + 'static> ConcurrentQueue<T> {
    /// Creates a new, empty queue with two freshly allocated sentinels.
    pub fn new() -> Self {
        let guard = &epoch::pin();
        let head_shared = Owned::new(Node::sentinel()).into_shared(guard);
        let tail_shared = Owned::new(Node::sentinel()).into_shared(guard);
        unsafe {
            head_shared.deref().next.store(tail_shared, Ordering::Release);
            tail_shared.deref().prev.store(head_shared, Ordering::Release);
        }

        let head = CachePadded::new(Atomic::null());
        let tail = CachePadded::new(Atomic::null());
        head.store(head_shared, Ordering::Relaxed);
        tail.store(tail_shared, Ordering::Relaxed);

        debug!("queue constructed");
        ConcurrentQueue {
            head,
            tail,
            size: AtomicU64::new(0),
            max_size: AtomicU64::new(0),
            enqueued_total: AtomicU64::new(0),
            dequeued_total: AtomicU64::new(0),
            enqueue_retries: AtomicU64::new(0),
            dequeue_retries: AtomicU64::new(0),
        }
    }

    /// Appends `payload` at the tail of the queue.
    ///
    /// This is the splice-before-TAIL algorithm: construct the node, then
    /// retry CAS-linking it in immediately before the TAIL sentinel until a
    /// concurrent enqueuer doesn't beat us to the same slot.
    pub fn enqueue(&self, payload: T) -> Result<(), EnqueueError> {
        let guard = &epoch::pin();
        let tail_shared = self.tail.load(Ordering::Relaxed, guard);
        let mut new_node = Owned::new(Node::with_payload(payload));

        loop {
            let p_shared = unsafe { tail_shared.deref() }.prev.load(Ordering::Acquire, guard);

            new_node.next.store(tail_shared, Ordering::Relaxed);
            new_node.prev.store(p_shared, Ordering::Relaxed);
            // Publish the fully initialized node before any concurrent
            // reader can observe it through the link we're about to CAS in.
            std::sync::atomic::fence(Ordering::Release);

            let p_ref = unsafe { p_shared.deref() };
            match p_ref
                .next
                .compare_exchange(tail_shared, new_node, Ordering::Release, Ordering::Acquire, guard)
            {
                Ok(new_shared) => {
                    unsafe { tail_shared.deref() }.prev.store(new_shared, Ordering::Release);
                    self.size.fetch_add(1, Ordering::Relaxed);
                    self.bump_max_size();
                    self.enqueued_total.fetch_add(1, Ordering::Relaxed);
                    debug!("enqueue succeeded");
                    return Ok(());
                }
                Err(e) => {
                    new_node = e.new;
                    self.enqueue_retries.fetch_add(1, Ordering::Relaxed);
                    trace!("enqueue CAS retry");
                }
            }
        }
    }

    /// Removes and returns the payload at the head of the queue, or
    /// `DequeueError::Empty` if none exists at the moment of observation.
    /// `Empty` is not a retry condition for the caller.
    pub fn try_dequeue(&self) -> Result<T, DequeueError> {
        let guard = &epoch::pin();
        let tail_shared = self.tail.load(Ordering::Relaxed, guard);

        loop {
            let head_shared = self.head.load(Ordering::Relaxed, guard);
            let head_ref = unsafe { head_shared.deref() };
            let f_shared = head_ref.next.load(Ordering::Acquire, guard);

            if f_shared == tail_shared {
                return Err(DequeueError::Empty);
            }

            let f_ref = unsafe { f_shared.deref() };
            if f_ref
                .busy
                .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_err()
            {
                self.dequeue_retries.fetch_add(1, Ordering::Relaxed);
                trace!("dequeue busy-flag claim lost");
                continue;
            }

            let n_shared = f_ref.next.load(Ordering::Acquire, guard);
            match head_ref
                .next
                .compare_exchange(f_shared, n_shared, Ordering::Release, Ordering::Acquire, guard)
            {
                Ok(_) => {
                    // Safe: we hold the claim on `f`, and it is the only
                    // thread that will ever read this payload out.
                    let payload = unsafe { ptr::read(f_ref.payload.as_ptr()) };

                    if n_shared != tail_shared {
                        unsafe { n_shared.deref() }.prev.store(head_shared, Ordering::Release);
                    } else {
                        unsafe { tail_shared.deref() }.prev.store(head_shared, Ordering::Release);
                    }

                    self.size.fetch_sub(1, Ordering::Relaxed);
                    self.dequeued_total.fetch_add(1, Ordering::Relaxed);
                    f_ref.busy.store(false, Ordering::Release);

                    // `f` is now retired: no live reference can be acquired
                    // through HEAD any more. Defer the free until no pinned
                    // guard could still be dereferencing it.
                    unsafe { guard.defer_destroy(f_shared) };

                    debug!("dequeue succeeded");
                    return Ok(payload);
                }
                Err(_) => {
                    f_ref.busy.store(false, Ordering::Release);
                    self.dequeue_retries.fetch_add(1, Ordering::Relaxed);
                    trace!("dequeue HEAD-advance CAS retry");
                }
            }
        }
    }

    /// Reports whether the queue is logically empty.
    ///
    /// Conservative in exactly one direction: it may return `false` for a
    /// queue that is momentarily empty, transiently during a concurrent
    /// enqueue, but never returns `true` while a node is fully linked
    /// between HEAD and TAIL.
    pub fn is_empty(&self) -> bool {
        let guard = &epoch::pin();
        let head_shared = self.head.load(Ordering::Relaxed, guard);
        let tail_shared = self.tail.load(Ordering::Relaxed, guard);
        let head_next = unsafe { head_shared.deref() }.next.load(Ordering::Acquire, guard);
        let tail_prev = unsafe { tail_shared.deref() }.prev.load(Ordering::Acquire, guard);
        head_next == tail_shared && tail_prev == head_shared
    }

    /// The current size: a point-in-time estimate under concurrent
    /// mutation, not a consistency signal.
    pub fn len(&self) -> u64 {
        self.size.load(Ordering::Acquire)
    }

    /// The monotone high-water mark of `len()` observed after any
    /// successful enqueue across the queue's lifetime.
    pub fn max_len(&self) -> u64 {
        self.max_size.load(Ordering::Relaxed)
    }

    /// A snapshot of `{size, max_size, enqueued_total, dequeued_total,
    /// enqueue_retries, dequeue_retries}`.
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            size: self.size.load(Ordering::Acquire),
            max_size: self.max_size.load(Ordering::Relaxed),
            enqueued_total: self.enqueued_total.load(Ordering::Relaxed),
            dequeued_total: self.dequeued_total.load(Ordering::Relaxed),
            enqueue_retries: self.enqueue_retries.load(Ordering::Relaxed),
            dequeue_retries: self.dequeue_retries.load(Ordering::Relaxed),
        }
    }

    fn bump_max_size(&self) {
        let observed_size = self.size.load(Ordering::Relaxed);
        let mut current_max = self.max_size.load(Ordering::Relaxed);
        while current_max < observed_size {
            match self.max_size.compare_exchange_weak(
                current_max,
                observed_size,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current_max = actual,
            }
        }
    }
}

impl<T: Send + 'static> Default for ConcurrentQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl ConcurrentQueue<Vec<u8>> {
    /// Copies `bytes` into a freshly allocated internal buffer and appends
    /// it at the tail. `bytes` may be empty; the caller's slice is never
    /// retained, so mutating it afterwards does not affect the queued copy.
    ///
    /// Fails with `EnqueueError::OutOfMemory` if the internal copy cannot be
    /// allocated; the queue is left unchanged.
    pub fn enqueue_bytes(&self, bytes: &[u8]) -> Result<(), EnqueueError> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(bytes.len())
            .map_err(|_| EnqueueError::OutOfMemory)?;
        buf.extend_from_slice(bytes);
        self.enqueue(buf)
    }
}

impl<T: Send + 'static> Drop for ConcurrentQueue<T> {
    /// Precondition: no concurrent operations are in flight and no
    /// previously dequeued payloads are still being dereferenced.
    /// Violating this precondition is undefined behavior. It is
    /// intentionally left unchecked: there is no hot-path assertion that
    /// could detect the violation without itself adding synchronization
    /// to every other operation.
    fn drop(&mut self) {
        while self.try_dequeue().is_ok() {}

        let guard = &epoch::pin();
        unsafe {
            let head_shared = self.head.swap(Shared::null(), Ordering::Relaxed, guard);
            let tail_shared = self.tail.swap(Shared::null(), Ordering::Relaxed, guard);
            guard.defer_destroy(head_shared);
            guard.defer_destroy(tail_shared);
        }
        debug!("queue destroyed");
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // Invariant 1: single-threaded FIFO for an arbitrary sequence of
        // variable-length payloads.
        #[test]
        fn single_threaded_fifo(payloads in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..64), 0..64)) {
            let q: ByteQueue = ConcurrentQueue::new();
            for p in &payloads {
                q.enqueue_bytes(p).unwrap();
            }
            for expected in &payloads {
                let actual = q.try_dequeue().unwrap();
                prop_assert_eq!(&actual, expected);
            }
            prop_assert_eq!(q.try_dequeue().unwrap_err(), DequeueError::Empty);
        }

        // Invariant 3: max_size equals the maximum size observed after any
        // successful enqueue.
        #[test]
        fn high_water_mark_tracks_peak_size(
            ops in proptest::collection::vec(any::<bool>(), 0..128)
        ) {
            let q: ByteQueue = ConcurrentQueue::new();
            let mut running = 0u64;
            let mut expected_max = 0u64;
            for enqueue in ops {
                if enqueue || running == 0 {
                    q.enqueue_bytes(b"x").unwrap();
                    running += 1;
                    expected_max = expected_max.max(running);
                } else {
                    if q.try_dequeue().is_ok() {
                        running -= 1;
                    }
                }
            }
            prop_assert_eq!(q.max_len(), expected_max);
        }
    }
}

#[cfg(loom)]
mod loom_tests {
    use super::*;
    use loom::thread;

    // A single enqueue racing a single dequeue on a fresh queue must never
    // let the dequeuer observe a partially linked node, and must never
    // double-free or use-after-free the retired node.
    #[test]
    fn enqueue_races_dequeue() {
        loom::model(|| {
            let q = loom::sync::Arc::new(ConcurrentQueue::<u8>::new());

            let producer = {
                let q = q.clone();
                thread::spawn(move || {
                    q.enqueue(7).unwrap();
                })
            };

            let result = q.try_dequeue();
            if let Ok(v) = result {
                assert_eq!(v, 7);
            }

            producer.join().unwrap();

            // Drain whatever the producer may have left behind, so the
            // queue's Drop impl runs cleanly under the model.
            while q.try_dequeue().is_ok() {}
            assert!(q.is_empty());
        });
    }
}
