//! A thin `extern "C"` veneer over [`crate::queue`], mirroring the literal
//! external-interface contract: `queue_init`, `queue_destroy`,
//! `queue_enqueue`, `queue_dequeue`, `queue_is_empty`, `queue_size`,
//! `queue_max_size`, and a statistics readout. The safe Rust API in
//! [`crate::queue`] is the primary surface this crate exposes; everything
//! here is a wrapper, not a second implementation.
//!
//! # Safety
//! Every function here takes raw pointers and trusts the caller to uphold
//! the usual C-ABI contract: pointers are either null or point at a live
//! value of the expected type, and `queue` handles are not used after
//! `queue_destroy`.

use std::ptr;

use crate::error::DequeueError;
use crate::queue::ByteQueue;
use crate::stats::QueueStats;

/// Allocates a new, empty queue and returns an owning handle to it.
#[no_mangle]
pub unsafe extern "C" fn queue_init() -> *mut ByteQueue {
    Box::into_raw(Box::new(ByteQueue::new()))
}

/// Precondition: no concurrent operations are in flight and no previously
/// dequeued payload is still being dereferenced. Violating this is undefined
/// behavior; it is not checked here, for the same reason it is not checked
/// in the safe API this wraps.
#[no_mangle]
pub unsafe extern "C" fn queue_destroy(queue: *mut ByteQueue) {
    if queue.is_null() {
        return;
    }
    drop(Box::from_raw(queue));
}

/// Copies `length` bytes starting at `bytes` into the queue. When `length`
/// is zero, `bytes` is ignored and may be null. Returns `false` without
/// mutating the queue if `queue` is null, or if `length` is positive and
/// `bytes` is null (`InvalidArgument`), or if the internal copy could not be
/// allocated (`OutOfMemory`).
#[no_mangle]
pub unsafe extern "C" fn queue_enqueue(queue: *const ByteQueue, bytes: *const u8, length: usize) -> bool {
    let Some(queue) = queue.as_ref() else {
        return false;
    };
    if length > 0 && bytes.is_null() {
        return false;
    }
    let slice = if length == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(bytes, length)
    };
    queue.enqueue_bytes(slice).is_ok()
}

/// Removes the payload at the head of the queue and writes its buffer and
/// length to `out_bytes`/`out_length`. Ownership of the buffer transfers to
/// the caller, who must release it with [`queue_free_payload`]. Returns
/// `false` (without writing the out-parameters) if `queue`, `out_bytes`, or
/// `out_length` is null, or if the queue is observed empty.
#[no_mangle]
pub unsafe extern "C" fn queue_dequeue(
    queue: *const ByteQueue,
    out_bytes: *mut *mut u8,
    out_length: *mut usize,
) -> bool {
    let Some(queue) = queue.as_ref() else {
        return false;
    };
    if out_bytes.is_null() || out_length.is_null() {
        return false;
    }
    match queue.try_dequeue() {
        Ok(payload) => {
            let mut boxed = payload.into_boxed_slice();
            let len = boxed.len();
            let ptr = boxed.as_mut_ptr();
            std::mem::forget(boxed);
            ptr::write(out_bytes, ptr);
            ptr::write(out_length, len);
            true
        }
        Err(DequeueError::Empty) | Err(DequeueError::InvalidArgument) => false,
    }
}

/// Releases a buffer previously returned by [`queue_dequeue`].
#[no_mangle]
pub unsafe extern "C" fn queue_free_payload(bytes: *mut u8, length: usize) {
    if bytes.is_null() {
        return;
    }
    drop(Vec::from_raw_parts(bytes, length, length));
}

#[no_mangle]
pub unsafe extern "C" fn queue_is_empty(queue: *const ByteQueue) -> bool {
    match queue.as_ref() {
        Some(queue) => queue.is_empty(),
        None => true,
    }
}

#[no_mangle]
pub unsafe extern "C" fn queue_size(queue: *const ByteQueue) -> u64 {
    queue.as_ref().map_or(0, |q| q.len())
}

#[no_mangle]
pub unsafe extern "C" fn queue_max_size(queue: *const ByteQueue) -> u64 {
    queue.as_ref().map_or(0, |q| q.max_len())
}

/// Writes a snapshot of `{size, max_size, enqueued_total, dequeued_total,
/// enqueue_retries, dequeue_retries}` to `out_stats`. Returns `false` if
/// `queue` or `out_stats` is null.
#[no_mangle]
pub unsafe extern "C" fn queue_stats(queue: *const ByteQueue, out_stats: *mut QueueStats) -> bool {
    let Some(queue) = queue.as_ref() else {
        return false;
    };
    if out_stats.is_null() {
        return false;
    }
    ptr::write(out_stats, queue.stats());
    true
}
