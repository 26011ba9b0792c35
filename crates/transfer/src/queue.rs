//! Bounded single-producer/single-consumer chunk queue.
//!
//! A fixed ring of chunk slots guarded by one mutex and two condition
//! variables ("not empty" for the consumer, "not full" for the
//! producer). `send` blocks while the ring is full, `recv` blocks while
//! it is empty and the producer is still open. Closing the producer side
//! sets a flag that never clears; the consumer drains whatever is queued
//! and then observes exactly one end-of-stream.
//!
//! Each end also notices when the other is gone: a sender whose receiver
//! was dropped fails fast instead of blocking forever on a full ring,
//! and a receiver whose sender was dropped without [`ChunkSender::finish`]
//! learns that the stream was cut short rather than completed.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use filedrop_protocol::Chunk;
use thiserror::Error;

/// Queue depth used by transfer pipelines.
pub const DEFAULT_CAPACITY: usize = 8;

/// Error returned by [`ChunkSender::send`] when the receiver is gone.
#[derive(Debug, Error, Eq, PartialEq)]
#[error("chunk receiver disconnected")]
pub struct SendError;

/// Why a drained queue produced no further chunk.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StreamEnd {
    /// The producer finished: every chunk of the stream was delivered.
    Complete,
    /// The producer went away without finishing: the stream is cut short.
    Aborted,
}

struct RingState {
    slots: Vec<Option<Chunk>>,
    head: usize,
    len: usize,
    /// Set once by the producer side; never clears.
    closed: Option<StreamEnd>,
    consumer_gone: bool,
}

struct Shared {
    state: Mutex<RingState>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl Shared {
    fn state_guard(&self) -> MutexGuard<'_, RingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Shared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shared").finish_non_exhaustive()
    }
}

/// Creates a bounded chunk queue of the given capacity.
///
/// # Panics
///
/// Panics if `capacity` is zero.
#[must_use]
pub fn bounded(capacity: usize) -> (ChunkSender, ChunkReceiver) {
    assert!(capacity >= 1, "queue capacity must be at least 1");
    let shared = Arc::new(Shared {
        state: Mutex::new(RingState {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            closed: None,
            consumer_gone: false,
        }),
        not_empty: Condvar::new(),
        not_full: Condvar::new(),
    });
    (
        ChunkSender {
            shared: Arc::clone(&shared),
            finished: false,
        },
        ChunkReceiver { shared },
    )
}

/// Producer end of the queue.
#[derive(Debug)]
pub struct ChunkSender {
    shared: Arc<Shared>,
    finished: bool,
}

impl ChunkSender {
    /// Enqueues one chunk, blocking while the ring is full.
    ///
    /// Fails with [`SendError`] once the receiver has been dropped; the
    /// chunk is discarded in that case.
    pub fn send(&self, chunk: Chunk) -> Result<(), SendError> {
        let mut state = self.shared.state_guard();
        while state.len == state.slots.len() && !state.consumer_gone {
            state = self
                .shared
                .not_full
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if state.consumer_gone {
            return Err(SendError);
        }

        let capacity = state.slots.len();
        let tail = (state.head + state.len) % capacity;
        state.slots[tail] = Some(chunk);
        state.len += 1;
        drop(state);
        self.shared.not_empty.notify_one();
        Ok(())
    }

    /// Marks the stream complete and closes the producer side.
    ///
    /// The receiver drains any queued chunks and then observes
    /// [`StreamEnd::Complete`]. Dropping the sender without calling this
    /// closes the queue with [`StreamEnd::Aborted`] instead.
    pub fn finish(mut self) {
        self.close(StreamEnd::Complete);
    }

    fn close(&mut self, end: StreamEnd) {
        if self.finished {
            return;
        }
        self.finished = true;
        let mut state = self.shared.state_guard();
        if state.closed.is_none() {
            state.closed = Some(end);
        }
        drop(state);
        // The consumer may be parked on an empty ring.
        self.shared.not_empty.notify_all();
    }
}

impl Drop for ChunkSender {
    fn drop(&mut self) {
        self.close(StreamEnd::Aborted);
    }
}

/// Consumer end of the queue.
#[derive(Debug)]
pub struct ChunkReceiver {
    shared: Arc<Shared>,
}

impl ChunkReceiver {
    /// Dequeues the next chunk, blocking while the ring is empty and the
    /// producer is still open.
    ///
    /// After the producer closes, queued chunks are still delivered in
    /// order; only then does the queue report how the stream ended.
    pub fn recv(&mut self) -> Result<Chunk, StreamEnd> {
        let mut state = self.shared.state_guard();
        while state.len == 0 && state.closed.is_none() {
            state = self
                .shared
                .not_empty
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if state.len == 0 {
            // Closed and fully drained; the flag never clears, so every
            // further call reports the same end.
            return Err(state.closed.unwrap_or(StreamEnd::Aborted));
        }

        let capacity = state.slots.len();
        let head = state.head;
        let chunk = state.slots[head].take().unwrap_or_else(|| {
            unreachable!("occupied ring slot was empty");
        });
        state.head = (state.head + 1) % capacity;
        state.len -= 1;
        drop(state);
        self.shared.not_full.notify_one();
        Ok(chunk)
    }
}

impl Drop for ChunkReceiver {
    fn drop(&mut self) {
        let mut state = self.shared.state_guard();
        state.consumer_gone = true;
        drop(state);
        // The producer may be parked on a full ring.
        self.shared.not_full.notify_all();
    }
}
