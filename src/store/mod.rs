//! Key-value persistence for timer records
//!
//! Timer records are stored as JSON strings under a key derived from the
//! booking identifier, so the countdown can be reconstructed after the
//! hosting process restarts.

pub mod file;
pub mod memory;
pub mod record;

use async_trait::async_trait;

use crate::error::StoreError;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use record::{timer_key, PersistedTimerRecord};

/// Asynchronous string-keyed store
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Removing a missing key succeeds
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}
