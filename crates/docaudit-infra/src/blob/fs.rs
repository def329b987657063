//! Local filesystem blob store
//!
//! Keys are `/`-separated paths relative to the store root, so the layout
//! `<user id>/<unique name>` used for uploads maps onto one directory per
//! user.

use async_trait::async_trait;
use docaudit_core::{BlobStore, BlobStoreError};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key below the root, rejecting absolute and parent components
    fn path_for(&self, key: &str) -> Result<PathBuf, BlobStoreError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(BlobStoreError::Backend(format!("invalid key: {}", key)));
        }
        Ok(self.root.join(relative))
    }

    /// Store `bytes` under `key`, creating parent directories
    pub async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), BlobStoreError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        debug!(key, bytes = bytes.len(), "Stored blob");
        Ok(())
    }

    fn key_for(root: &Path, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(root).ok()?;
        let parts: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        Some(parts.join("/"))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>, BlobStoreError> {
        let root = self.root.clone();
        let prefix = prefix.to_string();

        tokio::task::spawn_blocking(move || -> Result<Vec<String>, BlobStoreError> {
            if !root.exists() {
                return Ok(Vec::new());
            }

            let mut keys = Vec::new();
            for entry in WalkDir::new(&root).follow_links(false) {
                let entry = entry.map_err(|e| BlobStoreError::Backend(e.to_string()))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                if let Some(key) = Self::key_for(&root, entry.path()) {
                    if key.starts_with(&prefix) {
                        keys.push(key);
                    }
                }
            }
            keys.sort();
            Ok(keys)
        })
        .await
        .map_err(|e| BlobStoreError::Backend(e.to_string()))?
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>, BlobStoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobStoreError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// A `file://` target; local storage has no signing, so the TTL is only
    /// carried along for the caller
    async fn presigned_put_url(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<String, BlobStoreError> {
        let path = self.path_for(key)?;
        Ok(format!(
            "file://{}?content-type={}&expires-in={}",
            path.display(),
            content_type,
            ttl.as_secs()
        ))
    }
}
