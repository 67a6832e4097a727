//! S3 object store
//!
//! Works against AWS S3 and S3-compatible stores; the latter usually need
//! an endpoint override and path-style addressing.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

use super::{content_type_for, ObjectStore};
use crate::config::StoreConfig;
use crate::error::StoreError;

#[derive(Clone)]
pub struct S3Store {
    client: Arc<Client>,
}

impl S3Store {
    /// Create a store from an existing client
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Create a store using the ambient AWS configuration (environment,
    /// profile, instance role) with the overrides from `config`.
    pub async fn from_config(config: &StoreConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        tracing::debug!(
            endpoint = ?config.endpoint_url,
            path_style = config.force_path_style,
            "S3 client configured"
        );

        Self::new(Client::from_conf(builder.build()))
    }
}

/// Classify an SDK error by HTTP status first, then by error code
fn sdk_error<E>(bucket: &str, key: &str, err: SdkError<E, HttpResponse>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    match (status, err.code()) {
        (Some(404), _) | (_, Some("NoSuchKey")) | (_, Some("NoSuchBucket")) => {
            StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }
        }
        (Some(403), _) | (_, Some("AccessDenied")) => StoreError::AccessDenied {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        _ => StoreError::Transfer {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message: sdk_message(status, &err),
        },
    }
}

/// Short description of an SDK error without the raw response
fn sdk_message<E>(status: Option<u16>, err: &SdkError<E, HttpResponse>) -> String
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let detail = match (err.code(), err.message()) {
        (Some(code), Some(message)) => format!("{}: {}", code, message),
        (Some(code), None) => code.to_string(),
        (None, Some(message)) => message.to_string(),
        (None, None) => match std::error::Error::source(err) {
            Some(source) => format!("{}: {}", err, source),
            None => err.to_string(),
        },
    };
    match status {
        Some(status) => format!("HTTP {}: {}", status, detail),
        None => detail,
    }
}

fn transfer_error(bucket: &str, key: &str, message: String) -> StoreError {
    StoreError::Transfer {
        bucket: bucket.to_string(),
        key: key.to_string(),
        message,
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn get(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64, StoreError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| sdk_error(bucket, key, e))?;

        let write_error =
            |e: std::io::Error| transfer_error(bucket, key, format!("writing {}: {}", dest.display(), e));

        let mut file = tokio::fs::File::create(dest).await.map_err(write_error)?;
        let body = output.body.into_async_read();
        tokio::pin!(body);
        // Read and write failures surface from the same copy call
        let written = tokio::io::copy(&mut body, &mut file)
            .await
            .map_err(|e| transfer_error(bucket, key, format!("streaming body: {}", e)))?;
        file.flush().await.map_err(write_error)?;

        Ok(written)
    }

    async fn put(&self, bucket: &str, key: &str, src: &Path) -> Result<u64, StoreError> {
        let size = tokio::fs::metadata(src)
            .await
            .map_err(|e| transfer_error(bucket, key, format!("reading {}: {}", src.display(), e)))?
            .len();

        let body = ByteStream::from_path(src)
            .await
            .map_err(|e| transfer_error(bucket, key, format!("opening {}: {}", src.display(), e)))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type_for(key))
            .body(body)
            .send()
            .await
            .map_err(|e| sdk_error(bucket, key, e))?;

        Ok(size)
    }
}
