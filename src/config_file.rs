//! Configuration file support
//!
//! Loads handler configuration from TOML files. Every section and field is
//! optional; anything left out keeps its default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{Config, StoreBackend};
use crate::error::ConfigError;

/// Configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Webhook server settings
    pub server: Option<ServerSettings>,
    /// Encoder settings
    pub transcode: Option<TranscodeSettings>,
    /// Object store settings
    pub store: Option<StoreSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address to listen on
    pub listen: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscodeSettings {
    /// Target audio bitrate, e.g. "128k"
    pub bitrate: Option<String>,
    /// Encoder executable
    pub encoder: Option<PathBuf>,
    /// Suffix of keys that are converted
    pub source_suffix: Option<String>,
    /// Suffix of shipped keys
    pub target_suffix: Option<String>,
    /// Encoder output container
    pub output_format: Option<String>,
    /// Treat encoder stderr output as failure even on exit code 0
    pub fail_on_stderr: Option<bool>,
    /// Directory for the scoped temporary files
    pub temp_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSettings {
    /// "s3" or "fs"
    pub backend: Option<StoreBackend>,
    /// Root directory for the filesystem backend
    pub root: Option<PathBuf>,
    /// Custom endpoint for S3-compatible stores
    pub endpoint_url: Option<String>,
    /// Use path-style bucket addressing
    pub force_path_style: Option<bool>,
    /// Region override
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ConfigFile = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Generate a configuration file listing every default
    pub fn default_config() -> Self {
        let defaults = Config::default();
        Self {
            server: Some(ServerSettings {
                listen: Some(defaults.listen),
            }),
            transcode: Some(TranscodeSettings {
                bitrate: Some("128k".to_string()),
                encoder: Some(defaults.transcode.encoder),
                source_suffix: Some(defaults.transcode.source_suffix),
                target_suffix: Some(defaults.transcode.target_suffix),
                output_format: Some(defaults.transcode.output_format),
                fail_on_stderr: Some(defaults.transcode.fail_on_stderr),
                temp_dir: None,
            }),
            store: Some(StoreSettings {
                backend: Some(defaults.store.backend),
                root: None,
                endpoint_url: None,
                force_path_style: Some(defaults.store.force_path_style),
                region: None,
            }),
            logging: Some(LoggingSettings {
                level: Some(defaults.logging.level),
                format: Some(defaults.logging.format),
            }),
        }
    }

    /// Overlay the values present in this file onto `config`
    pub fn apply_to(self, config: &mut Config) {
        if let Some(server) = self.server {
            if let Some(listen) = server.listen {
                config.listen = listen;
            }
        }

        if let Some(t) = self.transcode {
            if let Some(v) = t.bitrate {
                config.transcode.bitrate = v;
            }
            if let Some(v) = t.encoder {
                config.transcode.encoder = v;
            }
            if let Some(v) = t.source_suffix {
                config.transcode.source_suffix = v;
            }
            if let Some(v) = t.target_suffix {
                config.transcode.target_suffix = v;
            }
            if let Some(v) = t.output_format {
                config.transcode.output_format = v;
            }
            if let Some(v) = t.fail_on_stderr {
                config.transcode.fail_on_stderr = v;
            }
            if t.temp_dir.is_some() {
                config.transcode.temp_dir = t.temp_dir;
            }
        }

        if let Some(s) = self.store {
            if let Some(v) = s.backend {
                config.store.backend = v;
            }
            if s.root.is_some() {
                config.store.root = s.root;
            }
            if s.endpoint_url.is_some() {
                config.store.endpoint_url = s.endpoint_url;
            }
            if let Some(v) = s.force_path_style {
                config.store.force_path_style = v;
            }
            if s.region.is_some() {
                config.store.region = s.region;
            }
        }

        if let Some(l) = self.logging {
            if let Some(v) = l.level {
                config.logging.level = v;
            }
            if let Some(v) = l.format {
                config.logging.format = v;
            }
        }
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigFile::default_config();
    config.to_file(path)?;
    Ok(())
}
