//! Lock aliases so callers don't depend on the lock implementation directly.

/// A synchronous read/write lock.
pub type SyncRwLock<T> = parking_lot::RwLock<T>;

/// A synchronous mutex.
pub type SyncMutex<T> = parking_lot::Mutex<T>;
