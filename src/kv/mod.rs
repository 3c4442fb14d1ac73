//! Key-Value Cache Module
//!
//! Short-lived memoization for computed results and resolved assignments:
//! - TTL on every write; expired entries read as misses
//! - In-memory backend, with the trait as the seam for an external cache
//! - Async-first API so networked caches slot in unchanged
//!
//! The cache is strictly an accelerator. Callers must treat every error
//! from a [`KvStore`] as a miss and fall back to recomputation.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use splitlab::kv::{KvStore, MemoryKvStore};
//!
//! # async fn example() -> splitlab::Result<()> {
//! let store = MemoryKvStore::new();
//!
//! store.set("key", b"value".to_vec(), Duration::from_secs(60)).await?;
//! let value = store.get("key").await?;
//! assert_eq!(value, Some(b"value".to_vec()));
//!
//! store.delete("key").await?;
//! assert!(!store.exists("key").await?);
//! # Ok(())
//! # }
//! ```

mod keys;
mod memory;

pub use keys::{assignment_key, results_key};
pub use memory::{MemoryKvStore, MAX_TTL};

use crate::Result;
use std::future::Future;
use std::time::Duration;

/// Cache store contract.
///
/// Matches the `get` / `set(ttl)` / `delete` surface of common networked
/// caches so a remote backend can be swapped in behind the engine.
pub trait KvStore: Send + Sync {
    /// Get a value by key.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Set a value for a key, expiring after `ttl`.
    ///
    /// Overwrites any existing value and resets its TTL.
    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> impl Future<Output = Result<()>> + Send;

    /// Delete a key.
    ///
    /// No-op if the key doesn't exist.
    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Check if a live (unexpired) key exists.
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send {
        async move { Ok(self.get(key).await?.is_some()) }
    }
}
