//! Session storage slots.
//!
//! The session store persists exactly one serialized record under one key.
//! Storage is synchronous: reading the current identity at startup never
//! waits on the network.

use crate::error::Result;

pub mod file;
pub mod inmemory;

pub use file::FileStorage;
pub use inmemory::InMemoryStorage;

/// Trait for key/value storage backing the session.
///
/// **IMPORTANT:** All methods use `&self`; implementations use interior
/// mutability so one storage handle can be shared by clones of the store.
pub trait SessionStorage: Send + Sync + Clone {
    /// Read the value under `key`.
    ///
    /// # Errors
    /// Returns `Error::Storage` if the slot cannot be read
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns `Error::Storage` if the slot cannot be written
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    /// Returns `Error::Storage` if the slot exists but cannot be removed
    fn remove(&self, key: &str) -> Result<()>;

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}
