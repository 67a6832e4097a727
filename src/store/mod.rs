//! Object store access
//!
//! The handler only needs two operations from the store: fetch a whole
//! object into a local file, and store a local file under a key. Both are
//! expressed by [`ObjectStore`] so the S3 client and the filesystem layout
//! used for local runs are interchangeable.

pub mod fs;
pub mod s3;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::{ConfigError, StoreError};

pub use fs::FsStore;
pub use s3::S3Store;

/// Key-addressed blob storage
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Fetch the whole object at `bucket`/`key` into `dest`, returning the
    /// number of bytes written.
    async fn get(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64, StoreError>;

    /// Store the contents of `src` at `bucket`/`key`, replacing any existing
    /// object. Returns the number of bytes stored.
    async fn put(&self, bucket: &str, key: &str, src: &Path) -> Result<u64, StoreError>;
}

/// Build the store selected by the configuration
pub async fn build_store(config: &StoreConfig) -> Result<Arc<dyn ObjectStore>, ConfigError> {
    match config.backend {
        StoreBackend::S3 => Ok(Arc::new(S3Store::from_config(config).await)),
        StoreBackend::Fs => {
            let root = config.root.clone().ok_or(ConfigError::Missing("store.root"))?;
            Ok(Arc::new(FsStore::new(root)))
        }
    }
}

/// Content type recorded for an uploaded key
pub fn content_type_for(key: &str) -> &'static str {
    let ext = key.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("ogg") | Some("oga") => "audio/ogg",
        Some("opus") => "audio/opus",
        Some("m4a") | Some("aac") => "audio/mp4",
        Some("flac") => "audio/flac",
        Some("wav") => "audio/wav",
        _ => "application/octet-stream",
    }
}
