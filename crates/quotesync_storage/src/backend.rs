//! Key-value store trait definition.

use crate::error::StorageResult;

/// A string key-value store.
///
/// Stores are **opaque string maps**. Callers own the encoding of values;
/// the store only keeps them.
///
/// # Invariants
///
/// - `get` returns exactly the value last passed to `set` for that key
/// - `set` is durable once it returns for durable implementations
/// - `remove` of an absent key is not an error
/// - Stores must be `Send + Sync` for shared access
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - Ephemeral, session-scoped
/// - [`super::FileStore`] - Durable, file-backed
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be read.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the change cannot be written.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Returns all keys currently present, in ascending order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be read.
    fn keys(&self) -> StorageResult<Vec<String>>;
}
