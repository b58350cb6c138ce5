use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::Store;
use crate::{Error, Result};

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared access to a [`Store`], handed to every component that persists data.
///
/// All clones of a handle share one write lock per namespace, so every
/// read-modify-write cycle on a namespace runs to completion before the next
/// one reads. Store calls are bounded by a timeout.
#[derive(Clone)]
pub struct StoreHandle {
    store: Arc<dyn Store>,
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
    timeout: Duration,
}

impl StoreHandle {
    pub fn new(store: impl Store + 'static) -> Self {
        Self::from_arc(Arc::new(store))
    }

    pub fn from_arc(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            locks: Arc::new(Mutex::new(HashMap::new())),
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Loads and decodes the collection under `namespace`.
    ///
    /// A namespace that was never written is an empty collection. A payload
    /// that is not a JSON array is logged and treated as empty; individual
    /// records that fail to decode are logged and skipped.
    pub async fn load<T: DeserializeOwned>(&self, namespace: &str) -> Result<Vec<T>> {
        let payload = self.bounded(namespace, self.store.load(namespace)).await?;
        Ok(payload.map(|p| decode(namespace, &p)).unwrap_or_default())
    }

    /// Replaces the whole collection under `namespace`.
    pub async fn save<T: Serialize>(&self, namespace: &str, records: &[T]) -> Result<()> {
        let lock = self.lock_for(namespace);
        let _guard = lock.lock().await;
        self.write(namespace, records).await
    }

    /// Read-modify-write cycle on `namespace` under its write lock.
    ///
    /// If `mutate` fails nothing is written, so callers never observe a
    /// partially applied mutation. Records that do not decode as `T` are
    /// written back unchanged after the mutated ones. A payload that is not a
    /// JSON array is never overwritten; the update fails with
    /// [`Error::StorageUnavailable`] instead.
    pub async fn update<T, R, F>(&self, namespace: &str, mutate: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut Vec<T>) -> Result<R>,
    {
        let lock = self.lock_for(namespace);
        let _guard = lock.lock().await;

        let payload = self.bounded(namespace, self.store.load(namespace)).await?;
        let Collection { mut records, opaque } = match payload {
            Some(payload) => split(namespace, &payload)?,
            None => Collection::default(),
        };
        let out = mutate(&mut records)?;

        if opaque.is_empty() {
            self.write(namespace, &records).await?;
        } else {
            tracing::warn!(
                namespace,
                kept = opaque.len(),
                "Writing back records that could not be decoded"
            );
            let mut values = records
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()?;
            values.extend(opaque);
            self.write(namespace, &values).await?;
        }
        Ok(out)
    }

    async fn write<T: Serialize>(&self, namespace: &str, records: &[T]) -> Result<()> {
        let payload = serde_json::to_string(records)?;
        self.bounded(namespace, self.store.save(namespace, payload))
            .await
    }

    async fn bounded<F, O>(&self, namespace: &str, call: F) -> Result<O>
    where
        F: Future<Output = Result<O>>,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| {
                tracing::warn!(
                    namespace,
                    timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                    "Store call timed out"
                );
                Error::StorageUnavailable(format!(
                    "store call on {namespace} timed out after {:?}",
                    self.timeout
                ))
            })?
    }

    fn lock_for(&self, namespace: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(namespace.to_owned()).or_default().clone()
    }
}

/// A stored collection split into the records that decode as `T` and the
/// raw values that do not.
struct Collection<T> {
    records: Vec<T>,
    opaque: Vec<serde_json::Value>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            opaque: Vec::new(),
        }
    }
}

fn split<T: DeserializeOwned>(namespace: &str, payload: &str) -> Result<Collection<T>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(payload).map_err(|e| {
        tracing::warn!(namespace, error = %e, "Refusing to overwrite corrupt collection");
        Error::StorageUnavailable(format!("collection {namespace} is not a JSON array: {e}"))
    })?;

    let mut collection = Collection::default();
    for value in values {
        match serde_json::from_value(value.clone()) {
            Ok(record) => collection.records.push(record),
            Err(_) => collection.opaque.push(value),
        }
    }
    Ok(collection)
}

fn decode<T: DeserializeOwned>(namespace: &str, payload: &str) -> Vec<T> {
    let values: Vec<serde_json::Value> = match serde_json::from_str(payload) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!(namespace, error = %e, "Discarding corrupt collection");
            return Vec::new();
        }
    };
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(namespace, index, error = %e, "Skipping corrupt record");
                None
            }
        })
        .collect()
}
