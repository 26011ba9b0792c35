//! Per-filename reader/writer coordination for the filedrop daemon.
//!
//! Concurrent sessions that name the same file must not interleave reads
//! with writes. This crate provides a process-wide [`LockRegistry`] that
//! maps filenames to reference-counted coordination objects, and a
//! writer-preference reader/writer lock ([`FileLock`]) on each object.
//!
//! Locking is two-tier: a single registry mutex guards the name → object
//! map, and each object carries its own mutex plus two condition
//! variables. The registry mutex is only ever taken on checkout and on
//! handle release, and the object mutex is never held while the registry
//! mutex is acquired. The lock order is therefore strictly
//! registry → object, which rules out deadlock between the tiers.
//!
//! Writer preference: an arriving or waiting writer blocks new readers,
//! so a steady stream of readers cannot starve writers. The converse is
//! accepted: a steady stream of writers may delay readers indefinitely.

mod lock;
mod registry;

pub use lock::{FileLock, LockStats, ReadGuard, WriteGuard};
pub use registry::{LockHandle, LockRegistry, MAX_NAME_LEN, RegistryError};
