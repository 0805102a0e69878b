use std::mem::MaybeUninit;
use std::sync::atomic::AtomicBool;

use crossbeam::epoch::Atomic;

/// A node in the queue's doubly linked list.
///
/// Sentinels (`Node::sentinel`) never hold a payload; their `payload` field
/// stays uninitialized for the node's entire lifetime. Data nodes have their
/// payload read out exactly once, by the dequeuer that wins the HEAD-advance
/// CAS over them, and never again after that (the node is retired).
pub(crate) struct Node<T> {
    pub(crate) payload: MaybeUninit<T>,
    pub(crate) next: Atomic<Node<T>>,
    pub(crate) prev: Atomic<Node<T>>,
    /// Two-state claim marker: `false` = free, `true` = held. Serializes the
    /// claim step of concurrent dequeuers racing on the same candidate node;
    /// it plays no part in enqueue.
    pub(crate) busy: AtomicBool,
}

impl<T> Node<T> {
    pub(crate) fn sentinel() -> Self {
        Node {
            payload: MaybeUninit::uninit(),
            next: Atomic::null(),
            prev: Atomic::null(),
            busy: AtomicBool::new(false),
        }
    }

    pub(crate) fn with_payload(payload: T) -> Self {
        Node {
            payload: MaybeUninit::new(payload),
            next: Atomic::null(),
            prev: Atomic::null(),
            busy: AtomicBool::new(false),
        }
    }
}
