use std::process::ExitStatus;

use thiserror::Error;

/// Failure of a single handler invocation.
///
/// Every variant is logged once by the handler with the object key and
/// bucket, then returned to the host unchanged.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Malformed trigger event: {0}")]
    EventParse(String),

    #[error("Cannot decode object key {key:?}: {reason}")]
    Decode { key: String, reason: String },

    #[error("Failed to retrieve object: {0}")]
    Retrieval(#[source] StoreError),

    #[error("Encoder failed: {0}")]
    Transcode(#[from] TranscodeError),

    #[error("Object key {key:?} does not end with {expected:?}")]
    UnexpectedSuffix { key: String, expected: String },

    #[error("Failed to store object: {0}")]
    Storage(#[source] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Encoder subprocess errors
#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("exited with {status}: {stderr}")]
    ExitStatus { status: ExitStatus, stderr: String },

    #[error("reported errors despite exiting successfully: {stderr}")]
    Stderr { stderr: String },

    #[error("produced no output")]
    EmptyOutput,
}

/// Object store errors, shared by the download and upload paths
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("access denied: {bucket}/{key}")]
    AccessDenied { bucket: String, key: String },

    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("transfer failed for {bucket}/{key}: {message}")]
    Transfer {
        bucket: String,
        key: String,
        message: String,
    },
}

/// Configuration errors, raised once at process start
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("Invalid value for {field}: {value:?}")]
    Invalid { field: &'static str, value: String },

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, HandlerError>;
