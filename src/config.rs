//! Handler configuration
//!
//! Built once at process start (defaults, then the optional TOML file, then
//! the environment), validated, and shared read-only by every invocation.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::config_file::ConfigFile;
use crate::error::ConfigError;

/// Environment variable holding the target bitrate
pub const BITRATE_ENV: &str = "TARGET_BITRATE";

fn bitrate_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+(\.\d+)?[kKmM]?$").unwrap())
}

/// Encoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeConfig {
    /// Target audio bitrate passed to the encoder, e.g. "128k"
    pub bitrate: String,

    /// Encoder executable, resolved through PATH when relative
    pub encoder: PathBuf,

    /// Keys ending with this suffix are converted
    pub source_suffix: String,

    /// Replaces `source_suffix` in the shipped key
    pub target_suffix: String,

    /// Container passed to the encoder's `-f`
    pub output_format: String,

    /// Fail the invocation when the encoder writes to stderr despite exiting 0
    pub fail_on_stderr: bool,

    /// Directory for scoped temporary files; OS default when unset
    pub temp_dir: Option<PathBuf>,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            bitrate: String::new(),
            encoder: PathBuf::from("ffmpeg"),
            source_suffix: ".ogg".to_string(),
            target_suffix: ".mp3".to_string(),
            output_format: "mp3".to_string(),
            fail_on_stderr: true,
            temp_dir: None,
        }
    }
}

impl TranscodeConfig {
    /// Directory the scoped temporary files are created in
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    S3,
    Fs,
}

/// Object store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Root directory of the filesystem backend; buckets are subdirectories
    pub root: Option<PathBuf>,

    /// Endpoint override for S3-compatible stores
    pub endpoint_url: Option<String>,

    /// Path-style addressing, needed by most S3-compatible stores
    pub force_path_style: bool,

    pub region: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::S3,
            root: None,
            endpoint_url: None,
            force_path_style: false,
            region: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,

    /// "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Process-wide configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Webhook listen address
    pub listen: String,

    pub transcode: TranscodeConfig,

    pub store: StoreConfig,

    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
            transcode: TranscodeConfig::default(),
            store: StoreConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load and validate the configuration for this process.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        if let Some(path) = path {
            ConfigFile::from_file(path)?.apply_to(&mut config);
        }
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Overlay environment variables, looked up through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(BITRATE_ENV) {
            self.transcode.bitrate = v.trim().to_string();
        }
        if let Some(v) = lookup("ENCODER_PATH") {
            self.transcode.encoder = PathBuf::from(v);
        }
        if let Some(v) = lookup("TEMP_DIR") {
            self.transcode.temp_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("STORE_ROOT") {
            self.store.backend = StoreBackend::Fs;
            self.store.root = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("S3_ENDPOINT_URL") {
            self.store.endpoint_url = Some(v);
        }
        if let Some(v) = lookup("S3_FORCE_PATH_STYLE") {
            self.store.force_path_style = matches!(v.as_str(), "1" | "true" | "yes");
        }
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bitrate = self.transcode.bitrate.trim();
        if bitrate.is_empty() {
            return Err(ConfigError::Missing(BITRATE_ENV));
        }
        if !bitrate_pattern().is_match(bitrate) {
            return Err(ConfigError::Invalid {
                field: "bitrate",
                value: self.transcode.bitrate.clone(),
            });
        }

        for (field, suffix) in [
            ("source_suffix", &self.transcode.source_suffix),
            ("target_suffix", &self.transcode.target_suffix),
        ] {
            if suffix.len() < 2 || !suffix.starts_with('.') {
                return Err(ConfigError::Invalid {
                    field,
                    value: suffix.clone(),
                });
            }
        }
        if self.transcode.source_suffix == self.transcode.target_suffix {
            return Err(ConfigError::Invalid {
                field: "target_suffix",
                value: self.transcode.target_suffix.clone(),
            });
        }

        if self.transcode.output_format.is_empty() {
            return Err(ConfigError::Invalid {
                field: "output_format",
                value: String::new(),
            });
        }

        if self.store.backend == StoreBackend::Fs && self.store.root.is_none() {
            return Err(ConfigError::Missing("store.root"));
        }

        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::Invalid {
                field: "listen",
                value: self.listen.clone(),
            });
        }

        Ok(())
    }
}
