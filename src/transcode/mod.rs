//! Audio transcoding module
//!
//! This module drives the external encoder:
//! - Command line construction from the configured bitrate and format
//! - Synchronous subprocess execution with captured output
//! - Exit status, stderr and output-file checks before anything is shipped

pub mod encoder;

pub use encoder::{Encoder, EncoderOutput};
