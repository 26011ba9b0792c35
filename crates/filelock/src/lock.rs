//! Writer-preference reader/writer lock built on a mutex and two
//! condition variables.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct LockState {
    active_readers: u32,
    active_writer: bool,
    waiting_writers: u32,
}

/// Snapshot of a lock's occupancy, for diagnostics and tests.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LockStats {
    /// Number of readers currently holding the lock.
    pub active_readers: u32,
    /// Whether a writer currently holds the lock.
    pub active_writer: bool,
    /// Number of writers blocked waiting for the lock.
    pub waiting_writers: u32,
}

/// Reader/writer coordination for one filename.
///
/// Readers share the lock; a writer is exclusive. Waiting writers take
/// preference over arriving readers: a reader blocks while any writer is
/// active *or waiting*, so writers cannot be starved by a steady reader
/// load.
#[derive(Debug, Default)]
pub struct FileLock {
    state: Mutex<LockState>,
    readers_ok: Condvar,
    writers_ok: Condvar,
}

impl FileLock {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Acquires shared read access, blocking while a writer is active or
    /// waiting.
    pub fn lock_read(&self) -> ReadGuard<'_> {
        let mut state = self.state_guard();
        while state.active_writer || state.waiting_writers > 0 {
            state = recover(self.readers_ok.wait(state));
        }
        state.active_readers += 1;
        ReadGuard { lock: self }
    }

    /// Acquires exclusive write access, blocking while readers or another
    /// writer are active.
    pub fn lock_write(&self) -> WriteGuard<'_> {
        let mut state = self.state_guard();
        state.waiting_writers += 1;
        while state.active_readers > 0 || state.active_writer {
            state = recover(self.writers_ok.wait(state));
        }
        state.waiting_writers -= 1;
        state.active_writer = true;
        WriteGuard { lock: self }
    }

    /// Returns a snapshot of the lock's current occupancy.
    #[must_use]
    pub fn stats(&self) -> LockStats {
        let state = self.state_guard();
        LockStats {
            active_readers: state.active_readers,
            active_writer: state.active_writer,
            waiting_writers: state.waiting_writers,
        }
    }

    fn unlock_read(&self) {
        let mut state = self.state_guard();
        state.active_readers -= 1;
        // The last reader out hands the lock to one waiting writer.
        if state.active_readers == 0 && state.waiting_writers > 0 {
            self.writers_ok.notify_one();
        }
    }

    fn unlock_write(&self) {
        let mut state = self.state_guard();
        state.active_writer = false;
        if state.waiting_writers > 0 {
            self.writers_ok.notify_one();
        } else {
            // Multiple readers may proceed at once, so every waiter must
            // be woken, not just one.
            self.readers_ok.notify_all();
        }
    }

    fn state_guard(&self) -> MutexGuard<'_, LockState> {
        // A poisoned mutex means a peer thread panicked while holding it;
        // the state transitions are all panic-free, so the counters are
        // still consistent and the lock keeps working.
        recover(self.state.lock())
    }
}

fn recover<T>(result: Result<T, PoisonError<T>>) -> T {
    result.unwrap_or_else(PoisonError::into_inner)
}

/// Shared read access to a [`FileLock`]; released on drop.
#[must_use = "dropping the guard releases the read lock immediately"]
#[derive(Debug)]
pub struct ReadGuard<'a> {
    lock: &'a FileLock,
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.lock.unlock_read();
    }
}

/// Exclusive write access to a [`FileLock`]; released on drop.
#[must_use = "dropping the guard releases the write lock immediately"]
#[derive(Debug)]
pub struct WriteGuard<'a> {
    lock: &'a FileLock,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.lock.unlock_write();
    }
}
