//! Process-wide registry of per-filename coordination objects.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::lock::{FileLock, ReadGuard, WriteGuard};

/// Longest filename the registry accepts, in bytes.
pub const MAX_NAME_LEN: usize = 255;

/// Errors returned by [`LockRegistry::checkout`].
#[derive(Debug, Error, Eq, PartialEq)]
pub enum RegistryError {
    /// The filename was empty.
    #[error("filename is empty")]
    EmptyName,
    /// The filename exceeded [`MAX_NAME_LEN`] bytes.
    #[error("filename of {length} bytes exceeds the {MAX_NAME_LEN}-byte limit")]
    NameTooLong {
        /// Byte length of the rejected name.
        length: usize,
    },
}

struct RegistryEntry {
    /// Sessions currently holding a handle to this object. The map never
    /// retains an entry whose count has reached zero.
    users: usize,
    lock: Arc<FileLock>,
}

/// Mapping from filename to its coordination object.
///
/// Checkout and release are the only operations that touch the map, each
/// under the single registry mutex, so the critical region stays short.
/// Coordination objects are owned by reference count: the last
/// [`LockHandle`] to drop unlinks the entry, and the object itself is
/// freed outside the registry mutex.
#[derive(Default)]
pub struct LockRegistry {
    files: Mutex<FxHashMap<String, RegistryEntry>>,
}

impl LockRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the coordination object for `name`, creating it on first
    /// use, and returns a handle that keeps it registered.
    pub fn checkout(self: &Arc<Self>, name: &str) -> Result<LockHandle, RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if name.len() > MAX_NAME_LEN {
            return Err(RegistryError::NameTooLong { length: name.len() });
        }

        let mut files = self.files_guard();
        let entry = files
            .entry(name.to_owned())
            .and_modify(|entry| entry.users += 1)
            .or_insert_with(|| RegistryEntry {
                users: 1,
                lock: Arc::new(FileLock::new()),
            });
        let lock = Arc::clone(&entry.lock);
        drop(files);

        Ok(LockHandle {
            registry: Arc::clone(self),
            lock,
            name: name.to_owned(),
        })
    }

    /// Returns the number of filenames currently registered.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.files_guard().len()
    }

    /// Returns `true` when no session holds a handle on any file.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.entry_count() == 0
    }

    fn release(&self, name: &str) {
        let mut files = self.files_guard();
        if let Some(entry) = files.get_mut(name) {
            entry.users -= 1;
            if entry.users == 0 {
                files.remove(name);
            }
        }
        // The map's Arc clone dies here at the latest; the handle's own
        // clone keeps the object alive until after the mutex is released.
    }

    fn files_guard(&self) -> MutexGuard<'_, FxHashMap<String, RegistryEntry>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for LockRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockRegistry")
            .field("entries", &self.entry_count())
            .finish()
    }
}

/// A checked-out reference to one filename's coordination object.
///
/// Holding the handle keeps the object registered; dropping it releases
/// the reference and unlinks the object once the last holder is gone.
/// Lock guards borrow the handle, so the release order is always
/// lock before registry reference.
#[derive(Debug)]
pub struct LockHandle {
    registry: Arc<LockRegistry>,
    lock: Arc<FileLock>,
    name: String,
}

impl LockHandle {
    /// Returns the filename this handle coordinates.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Acquires shared read access to the file.
    pub fn read(&self) -> ReadGuard<'_> {
        self.lock.lock_read()
    }

    /// Acquires exclusive write access to the file.
    pub fn write(&self) -> WriteGuard<'_> {
        self.lock.lock_write()
    }

    /// Returns the underlying coordination object.
    #[must_use]
    pub fn file_lock(&self) -> &Arc<FileLock> {
        &self.lock
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        self.registry.release(&self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_rejects_empty_name() {
        let registry = Arc::new(LockRegistry::new());
        assert_eq!(
            registry.checkout("").unwrap_err(),
            RegistryError::EmptyName
        );
        assert!(registry.is_idle());
    }

    #[test]
    fn checkout_rejects_oversized_name() {
        let registry = Arc::new(LockRegistry::new());
        let name = "n".repeat(MAX_NAME_LEN + 1);
        assert_eq!(
            registry.checkout(&name).unwrap_err(),
            RegistryError::NameTooLong { length: 256 }
        );
    }

    #[test]
    fn checkout_accepts_name_at_the_limit() {
        let registry = Arc::new(LockRegistry::new());
        let name = "n".repeat(MAX_NAME_LEN);
        let handle = registry.checkout(&name).expect("checkout");
        assert_eq!(handle.name(), name);
    }

    #[test]
    fn same_name_shares_one_coordination_object() {
        let registry = Arc::new(LockRegistry::new());
        let first = registry.checkout("data.bin").expect("checkout");
        let second = registry.checkout("data.bin").expect("checkout");

        assert!(Arc::ptr_eq(first.file_lock(), second.file_lock()));
        assert_eq!(registry.entry_count(), 1);
    }

    #[test]
    fn distinct_names_get_distinct_objects() {
        let registry = Arc::new(LockRegistry::new());
        let first = registry.checkout("a.bin").expect("checkout");
        let second = registry.checkout("b.bin").expect("checkout");

        assert!(!Arc::ptr_eq(first.file_lock(), second.file_lock()));
        assert_eq!(registry.entry_count(), 2);
    }

    #[test]
    fn last_release_unlinks_the_entry() {
        let registry = Arc::new(LockRegistry::new());
        let first = registry.checkout("data.bin").expect("checkout");
        let second = registry.checkout("data.bin").expect("checkout");

        drop(first);
        assert_eq!(registry.entry_count(), 1);
        drop(second);
        assert!(registry.is_idle());
    }

    #[test]
    fn name_reuse_after_release_creates_a_fresh_object() {
        let registry = Arc::new(LockRegistry::new());
        let first = registry.checkout("data.bin").expect("checkout");
        let first_lock = Arc::clone(first.file_lock());
        drop(first);

        let second = registry.checkout("data.bin").expect("checkout");
        assert!(!Arc::ptr_eq(&first_lock, second.file_lock()));
    }
}
