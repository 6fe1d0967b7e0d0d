//! Persistent store adapter trait

use crate::Result;

/// Narrow interface to an origin-scoped, string-keyed key-value store.
///
/// The rating subsystem never touches a storage engine directly; every raw
/// read and write goes through this adapter. Implementations include the
/// in-memory reference store and anything shaped like browser local
/// storage.
pub trait RatingStore: Send + Sync + 'static {
    /// Read the raw value stored under `key`, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Enumerate every key currently present in the origin.
    ///
    /// Needed by the legacy compound-key sample source and the migration
    /// sweep, both of which scan the whole origin.
    fn keys(&self) -> Result<Vec<String>>;

    /// Whether `key` is currently present.
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}
