use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::Store;
use crate::{Error, Result};

/// In-process [`Store`]. Clones share the same data.
///
/// Can be switched unavailable or slowed down to exercise the failure paths
/// of the components sitting on top of it.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    data: Arc<RwLock<HashMap<String, String>>>,
    available: Arc<AtomicBool>,
    latency: Option<Duration>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            available: Arc::new(AtomicBool::new(true)),
            latency: None,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every load and save by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Simulates disabled storage or an exceeded quota.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Raw payload stored under `namespace`.
    pub async fn raw(&self, namespace: &str) -> Option<String> {
        self.data.read().await.get(namespace).cloned()
    }

    /// Overwrites the raw payload, bypassing serialization.
    pub async fn put_raw(&self, namespace: &str, payload: impl Into<String>) {
        self.data
            .write()
            .await
            .insert(namespace.to_owned(), payload.into());
    }

    async fn enter(&self) -> Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if !self.available.load(Ordering::SeqCst) {
            return Err(Error::StorageUnavailable("memory store disabled".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load(&self, namespace: &str) -> Result<Option<String>> {
        self.enter().await?;
        Ok(self.data.read().await.get(namespace).cloned())
    }

    async fn save(&self, namespace: &str, payload: String) -> Result<()> {
        self.enter().await?;
        self.data
            .write()
            .await
            .insert(namespace.to_owned(), payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_namespace_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.load("nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = MemoryStore::new();
        store.save("ns", "[1,2]".into()).await.unwrap();
        assert_eq!(store.load("ns").await.unwrap().as_deref(), Some("[1,2]"));
    }

    #[tokio::test]
    async fn test_unavailable() {
        let store = MemoryStore::new();
        store.set_available(false);
        assert!(matches!(
            store.load("ns").await,
            Err(Error::StorageUnavailable(_))
        ));
        assert!(matches!(
            store.save("ns", "[]".into()).await,
            Err(Error::StorageUnavailable(_))
        ));

        store.set_available(true);
        assert!(store.save("ns", "[]".into()).await.is_ok());
    }

    #[tokio::test]
    async fn test_clones_share_data() {
        let store = MemoryStore::new();
        store.clone().put_raw("ns", "[]").await;
        assert_eq!(store.raw("ns").await.as_deref(), Some("[]"));
    }
}
