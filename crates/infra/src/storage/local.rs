use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use encore_core::ObjectStorage;
use encore_domain::{EncoreError, Result, StorageConfig};
use tokio::fs;
use tracing::{debug, info};

/// Filesystem-backed object storage served under a public base URL
#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.root_dir, &config.public_base_url)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an object key onto the root. Keys may only hold plain segments.
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let plain = !key.is_empty()
            && relative.components().all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(EncoreError::InvalidInput(format!("invalid storage path: {key}")));
        }
        Ok(self.root.join(relative))
    }

    fn public_url(&self, key: &str) -> String {
        let encoded: Vec<_> = key.split('/').map(urlencoding::encode).collect();
        format!("{}/{}", self.public_base_url, encoded.join("/"))
    }
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> EncoreError {
    EncoreError::Storage(format!("failed to {action} {}: {err}", path.display()))
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(|e| io_error("create", parent, e))?;
        }

        // Write beside the target, then rename, so readers never see a partial file.
        let staging = target.with_extension("partial");
        fs::write(&staging, &bytes).await.map_err(|e| io_error("write", &staging, e))?;
        fs::rename(&staging, &target).await.map_err(|e| io_error("move", &target, e))?;

        info!(path, size = bytes.len(), content_type, "stored object");
        Ok(self.public_url(path))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        match fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path, "object already absent");
                Ok(())
            }
            Err(err) => Err(io_error("delete", &target, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn put_writes_file_and_returns_public_url() {
        let dir = TempDir::new().unwrap();
        let storage = LocalObjectStorage::new(dir.path(), "https://files.encore.test/");

        let url = storage
            .put("gigs/g1/setlist 1.pdf", b"%PDF-1.7".to_vec(), "application/pdf")
            .await
            .unwrap();

        assert_eq!(url, "https://files.encore.test/gigs/g1/setlist%201.pdf");
        let written = std::fs::read(dir.path().join("gigs/g1/setlist 1.pdf")).unwrap();
        assert_eq!(written, b"%PDF-1.7");
        assert!(!dir.path().join("gigs/g1/setlist 1.partial").exists());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let storage = LocalObjectStorage::new(dir.path(), "http://localhost/files");
        storage.put("a/b.pdf", vec![1, 2, 3], "application/pdf").await.unwrap();

        storage.delete("a/b.pdf").await.unwrap();
        storage.delete("a/b.pdf").await.unwrap();
        assert!(!dir.path().join("a/b.pdf").exists());
    }

    #[tokio::test]
    async fn rejects_paths_escaping_the_root() {
        let dir = TempDir::new().unwrap();
        let storage = LocalObjectStorage::new(dir.path().join("root"), "http://localhost/files");

        for key in ["../escape.pdf", "/etc/passwd", "a/../../b", ""] {
            let err = storage.put(key, vec![0], "application/pdf").await.unwrap_err();
            assert!(matches!(err, EncoreError::InvalidInput(_)), "{key}: {err:?}");
        }
    }
}
