//! A lock-free, multi-producer multi-consumer FIFO queue of opaque byte
//! payloads.
//!
//! The queue is a doubly linked list terminated by two permanent sentinel
//! nodes (`HEAD`, `TAIL`). Producers splice a new node in immediately before
//! `TAIL` with a compare-and-swap; consumers advance `HEAD` past the first
//! live node with a compare-and-swap. Both protocols are lock-free: a losing
//! thread retries with fresh inputs rather than blocking. Removed nodes are
//! not freed until [`crossbeam::epoch`] determines no pinned thread could
//! still be dereferencing them, which is what makes the structure safe to
//! share across threads without a garbage collector or reference counting
//! in the hot path.
//!
//! ```
//! use conc_byte_queue::ByteQueue;
//!
//! let queue = ByteQueue::new();
//! queue.enqueue_bytes(b"hello").unwrap();
//! assert_eq!(queue.try_dequeue().unwrap(), b"hello".to_vec());
//! ```
//!
//! See [`ConcurrentQueue`] for the full API, and [`ffi`] for the raw
//! pointer-based surface meant for non-Rust callers.

mod error;
mod ffi;
mod node;
mod queue;
mod stats;

pub use error::{DequeueError, EnqueueError};
pub use ffi::{
    queue_destroy, queue_dequeue, queue_enqueue, queue_free_payload, queue_init, queue_is_empty,
    queue_max_size, queue_size, queue_stats,
};
pub use queue::{ByteQueue, ConcurrentQueue};
pub use stats::QueueStats;
