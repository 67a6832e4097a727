//! Object-created notifications
//!
//! Mirrors the S3 event notification document. Only the bucket name and
//! object key of the first record drive the handler; the remaining fields
//! are optional and used for diagnostics.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{HandlerError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records")]
    pub records: Vec<S3Record>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Record {
    pub s3: S3Entity,
    #[serde(rename = "eventName")]
    pub event_name: Option<String>,
    #[serde(rename = "eventTime")]
    pub event_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Object {
    /// Form-encoded key, see [`crate::key::decode_key`]
    pub key: String,
    pub size: Option<u64>,
}

/// Bucket and still-encoded key of the object that triggered an invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub raw_key: String,
}

impl S3Event {
    /// Parse a notification document
    pub fn from_slice(payload: &[u8]) -> Result<Self> {
        serde_json::from_slice(payload).map_err(|e| HandlerError::EventParse(e.to_string()))
    }

    /// Build a single-record event, as the store would deliver it
    pub fn single(bucket: &str, raw_key: &str) -> Self {
        Self {
            records: vec![S3Record {
                s3: S3Entity {
                    bucket: S3Bucket {
                        name: bucket.to_string(),
                    },
                    object: S3Object {
                        key: raw_key.to_string(),
                        size: None,
                    },
                },
                event_name: None,
                event_time: None,
            }],
        }
    }

    /// The first record, which is the only one processed
    pub fn first_record(&self) -> Result<&S3Record> {
        self.records
            .first()
            .ok_or_else(|| HandlerError::EventParse("event contains no records".to_string()))
    }

    /// Bucket and raw key of the first record
    pub fn object_ref(&self) -> Result<ObjectRef> {
        let record = self.first_record()?;
        let bucket = &record.s3.bucket.name;
        if bucket.is_empty() {
            return Err(HandlerError::EventParse("bucket name is empty".to_string()));
        }
        Ok(ObjectRef {
            bucket: bucket.clone(),
            raw_key: record.s3.object.key.clone(),
        })
    }
}
