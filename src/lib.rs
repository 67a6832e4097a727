//! ogg2mp3
//!
//! Converts audio objects to MP3 as they land in an object store. Each
//! object-created notification is one handler invocation: the object is
//! downloaded, run through an external encoder and stored next to the
//! source under the same name with the new extension.
//!
//! The handler can be hosted as a webhook for bucket notifications
//! (`ogg2mp3 serve`) or run once for a single notification
//! (`ogg2mp3 handle`).

pub mod config;
pub mod config_file;
pub mod error;
pub mod event;
pub mod handler;
pub mod http;
pub mod key;
pub mod state;
pub mod store;
pub mod transcode;

#[cfg(test)]
mod integration;

pub use config::Config;
pub use error::{HandlerError, Result};
pub use event::S3Event;
pub use handler::{Handler, SUCCESS};
