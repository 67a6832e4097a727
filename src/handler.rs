//! Event handler
//!
//! One invocation per object-created notification: extract and decode the
//! key, fetch the object into a scoped temporary file, run the encoder into a
//! second one, and ship the result next to the source under the derived key.
//! Both temporary files are removed when the invocation returns, whatever the
//! outcome.

use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::config::TranscodeConfig;
use crate::error::{HandlerError, Result};
use crate::event::{ObjectRef, S3Event};
use crate::key::{decode_key, target_key};
use crate::store::ObjectStore;
use crate::transcode::Encoder;

/// Returned by a successful invocation
pub const SUCCESS: &str = "OK";

/// Result of a completed conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shipped {
    pub bucket: String,
    pub source_key: String,
    pub target_key: String,
    pub bytes: u64,
}

/// Converts triggering objects; cheap to share between concurrent invocations
#[derive(Clone)]
pub struct Handler {
    config: Arc<TranscodeConfig>,
    encoder: Encoder,
    store: Arc<dyn ObjectStore>,
}

impl Handler {
    pub fn new(config: Arc<TranscodeConfig>, store: Arc<dyn ObjectStore>) -> Self {
        let encoder = Encoder::from_config(&config);
        Self {
            config,
            encoder,
            store,
        }
    }

    /// Parse a raw notification document and handle it
    pub async fn handle_payload(&self, payload: &[u8]) -> Result<&'static str> {
        let event = S3Event::from_slice(payload).inspect_err(|e| {
            tracing::error!(error = %e, "rejecting trigger event");
        })?;
        self.handle(&event).await
    }

    /// Handle one notification, returning [`SUCCESS`] once the converted
    /// object is stored.
    ///
    /// Failures are logged with the bucket and key, then returned unchanged.
    pub async fn handle(&self, event: &S3Event) -> Result<&'static str> {
        let object = event.object_ref().inspect_err(|e| {
            tracing::error!(error = %e, "rejecting trigger event");
        })?;

        let span = tracing::info_span!(
            "invocation",
            id = %Uuid::new_v4(),
            bucket = %object.bucket,
            key = %object.raw_key,
        );

        async {
            if event.records.len() > 1 {
                tracing::warn!(
                    ignored = event.records.len() - 1,
                    "event carries more than one record, only the first is processed"
                );
            }
            if let Ok(record) = event.first_record() {
                let age = record
                    .event_time
                    .map(|t| (chrono::Utc::now() - t).num_milliseconds());
                tracing::debug!(event_name = ?record.event_name, size = ?record.s3.object.size, age_ms = ?age, "handling event");
            }

            match self.convert(&object).await {
                Ok(shipped) => {
                    tracing::info!(
                        bucket = %shipped.bucket,
                        key = %shipped.target_key,
                        bytes = shipped.bytes,
                        "shipped {} to bucket {}",
                        shipped.target_key,
                        shipped.bucket
                    );
                    Ok(SUCCESS)
                }
                Err(e) => {
                    tracing::error!(
                        bucket = %object.bucket,
                        key = %object.raw_key,
                        error = %e,
                        "failed to convert {} in bucket {}",
                        object.raw_key,
                        object.bucket
                    );
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Download, transcode and upload one object.
    ///
    /// The temporary files live in this frame, so every return path deletes
    /// them.
    pub async fn convert(&self, object: &ObjectRef) -> Result<Shipped> {
        let key = decode_key(&object.raw_key)?;
        let target = target_key(&key, &self.config.source_suffix, &self.config.target_suffix)?;

        let temp_dir = self.config.temp_dir();
        let source_file = tempfile::Builder::new()
            .prefix("source-")
            .suffix(&self.config.source_suffix)
            .tempfile_in(&temp_dir)?;
        let target_file = tempfile::Builder::new()
            .prefix("target-")
            .suffix(&self.config.target_suffix)
            .tempfile_in(&temp_dir)?;

        let fetched = self
            .store
            .get(&object.bucket, &key, source_file.path())
            .await
            .map_err(HandlerError::Retrieval)?;
        tracing::debug!(bytes = fetched, store = self.store.name(), "downloaded {}", key);

        let encoded = self.encoder.run(source_file.path(), target_file.path()).await?;
        tracing::debug!(bytes = encoded.output_size, "transcoded {}", key);

        let stored = self
            .store
            .put(&object.bucket, &target, target_file.path())
            .await
            .map_err(HandlerError::Storage)?;

        Ok(Shipped {
            bucket: object.bucket.clone(),
            source_key: key,
            target_key: target,
            bytes: stored,
        })
    }
}
