use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::Store;
use crate::{Error, Result};

/// [`Store`] keeping one `<namespace>.json` file per namespace in a directory.
///
/// Saves go to a temporary sibling first and are renamed into place, so a
/// reader never sees a half-written collection.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (and creates if needed) the store directory.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_owned();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            Error::StorageUnavailable(format!("cannot create {}: {e}", dir.display()))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, namespace: &str) -> Result<PathBuf> {
        let valid = !namespace.is_empty()
            && !namespace.starts_with('.')
            && namespace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid {
            return Err(Error::InvalidInput(format!("invalid namespace {namespace:?}")));
        }
        Ok(self.dir.join(format!("{namespace}.json")))
    }
}

#[async_trait]
impl Store for FileStore {
    async fn load(&self, namespace: &str) -> Result<Option<String>> {
        let path = self.path_for(namespace)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::StorageUnavailable(format!(
                "cannot read {}: {e}",
                path.display()
            ))),
        }
    }

    async fn save(&self, namespace: &str, payload: String) -> Result<()> {
        let path = self.path_for(namespace)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, payload).await.map_err(|e| {
            Error::StorageUnavailable(format!("cannot write {}: {e}", tmp.display()))
        })?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| {
            Error::StorageUnavailable(format!("cannot replace {}: {e}", path.display()))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        assert_eq!(store.load("wallet.transactions").await.unwrap(), None);
        store
            .save("wallet.transactions", "[]".into())
            .await
            .unwrap();

        let reopened = FileStore::open(dir.path()).await.unwrap();
        assert_eq!(
            reopened.load("wallet.transactions").await.unwrap().as_deref(),
            Some("[]")
        );
        assert!(dir.path().join("wallet.transactions.json").exists());
        assert!(!dir.path().join("wallet.transactions.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_creates_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileStore::open(&nested).await.unwrap();
        assert_eq!(store.dir(), nested.as_path());
        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn test_rejects_path_like_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        assert!(matches!(
            store.load("../escape").await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            store.save("", "[]".into()).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_unwritable_dir_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        // A directory squatting on the target name makes the rename fail.
        std::fs::create_dir(dir.path().join("ns.json")).unwrap();
        assert!(matches!(
            store.save("ns", "[]".into()).await,
            Err(Error::StorageUnavailable(_))
        ));
    }
}
