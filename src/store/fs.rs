//! Filesystem-backed object store
//!
//! Buckets are directories under a root and keys are relative paths inside
//! them. Used for local runs and tests.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use super::ObjectStore;
use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve `bucket`/`key` to a path under the root.
    ///
    /// Only plain path components are accepted, so no key can reach outside
    /// its bucket directory.
    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StoreError> {
        let bucket_path = Path::new(bucket);
        let key_path = Path::new(key);

        let plain = |p: &Path| {
            p.components().next().is_some()
                && p.components().all(|c| matches!(c, Component::Normal(_)))
        };
        if !plain(bucket_path) || bucket_path.components().count() != 1 {
            return Err(StoreError::InvalidKey(format!("bucket {:?}", bucket)));
        }
        if !plain(key_path) || key.ends_with('/') {
            return Err(StoreError::InvalidKey(format!("key {:?}", key)));
        }

        Ok(self.root.join(bucket_path).join(key_path))
    }
}

fn io_error(bucket: &str, key: &str, err: std::io::Error) -> StoreError {
    match err.kind() {
        ErrorKind::NotFound => StoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        ErrorKind::PermissionDenied => StoreError::AccessDenied {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        _ => StoreError::Transfer {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message: err.to_string(),
        },
    }
}

#[async_trait]
impl ObjectStore for FsStore {
    fn name(&self) -> &'static str {
        "fs"
    }

    async fn get(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64, StoreError> {
        let path = self.object_path(bucket, key)?;
        tokio::fs::copy(&path, dest)
            .await
            .map_err(|e| io_error(bucket, key, e))
    }

    /// Copies into a staging file beside the object and renames it into
    /// place, so the key holds either the previous object or the complete
    /// new one.
    async fn put(&self, bucket: &str, key: &str, src: &Path) -> Result<u64, StoreError> {
        let path = self.object_path(bucket, key)?;
        let parent = path
            .parent()
            .ok_or_else(|| StoreError::InvalidKey(format!("key {:?}", key)))?;
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| io_error(bucket, key, e))?;

        let staging = tempfile::Builder::new()
            .prefix(".put-")
            .tempfile_in(parent)
            .map_err(|e| io_error(bucket, key, e))?;
        let size = tokio::fs::copy(src, staging.path())
            .await
            .map_err(|e| io_error(bucket, key, e))?;
        staging
            .persist(&path)
            .map_err(|e| io_error(bucket, key, e.error))?;
        Ok(size)
    }
}
