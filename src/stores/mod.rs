//! Storage layer for the wallet ledger. Provides:
//! - The [`Store`] trait: whole-collection get/set keyed by a namespace string
//! - An in-process backend ([`MemoryStore`]) and a directory backend ([`FileStore`])
//! - [`StoreHandle`], the capability every component is given, which decodes
//!   collections and serializes writes per namespace
//!
//! Backends only move opaque JSON payloads around. Everything about record
//! shape, corruption recovery, write ordering and timeouts lives in the handle.

mod file;
mod handle;
mod memory;

use async_trait::async_trait;

use crate::Result;

pub use file::FileStore;
pub use handle::StoreHandle;
pub use memory::MemoryStore;

pub const PAYMENT_METHODS_NAMESPACE: &str = "wallet.payment_methods";
pub const TRANSACTIONS_NAMESPACE: &str = "wallet.transactions";

/// Durable key-value medium holding one serialized collection per namespace.
///
/// Implementations return `Ok(None)` for a namespace that was never written
/// and [`crate::Error::StorageUnavailable`] when the medium cannot be used.
#[async_trait]
pub trait Store: Send + Sync {
    async fn load(&self, namespace: &str) -> Result<Option<String>>;

    async fn save(&self, namespace: &str, payload: String) -> Result<()>;
}
