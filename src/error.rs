use thiserror::Error;

/// Operation-level failures for `enqueue`.
///
/// `InvalidArgument` is only reachable through the [`crate::ffi`] veneer: a
/// safe `&[u8]` argument can never be null, so the safe API can construct
/// this variant but never return it from `enqueue`/`enqueue_bytes`. It stays
/// in the enum anyway so both surfaces share one error type and one set of
/// statistics semantics.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueError {
    #[error("payload pointer is null but length is non-zero")]
    InvalidArgument,
    #[error("allocation failed while copying the payload")]
    OutOfMemory,
}

/// Operation-level outcomes for `try_dequeue`.
///
/// `Empty` is not an error in the ordinary sense — it is the distinguished
/// non-success result described by the queue's contract, and statistics are
/// not incremented when it is returned.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DequeueError {
    #[error("queue handle or output pointer is null")]
    InvalidArgument,
    #[error("the queue is empty")]
    Empty,
}
