//! External encoder invocation
//!
//! Runs the encoder binary once per conversion and waits for it to exit.
//! A conversion only counts as successful when the process exits cleanly,
//! stays quiet on stderr (unless configured otherwise) and leaves a
//! non-empty output file behind.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use crate::config::TranscodeConfig;
use crate::error::TranscodeError;

/// Captured result of a successful encoder run
#[derive(Debug, Clone)]
pub struct EncoderOutput {
    pub stdout: String,
    pub stderr: String,
    /// Size of the produced file in bytes
    pub output_size: u64,
}

/// Command-line encoder, configured once per process
#[derive(Debug, Clone)]
pub struct Encoder {
    program: PathBuf,
    bitrate: String,
    format: String,
    fail_on_stderr: bool,
}

impl Encoder {
    pub fn new(program: impl Into<PathBuf>, bitrate: &str, format: &str) -> Self {
        Self {
            program: program.into(),
            bitrate: bitrate.to_string(),
            format: format.to_string(),
            fail_on_stderr: true,
        }
    }

    pub fn from_config(config: &TranscodeConfig) -> Self {
        Self::new(&config.encoder, &config.bitrate, &config.output_format)
            .fail_on_stderr(config.fail_on_stderr)
    }

    pub fn fail_on_stderr(mut self, enabled: bool) -> Self {
        self.fail_on_stderr = enabled;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Encoder arguments for one conversion.
    ///
    /// `-y` is required because the output path is a temporary file that
    /// already exists.
    pub fn args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            input.as_os_str().to_owned(),
            "-b:a".into(),
            self.bitrate.as_str().into(),
            "-f".into(),
            self.format.as_str().into(),
            "-y".into(),
            output.as_os_str().to_owned(),
        ]
    }

    /// Convert `input` into `output`, blocking the invocation until the
    /// encoder exits.
    pub async fn run(&self, input: &Path, output: &Path) -> Result<EncoderOutput, TranscodeError> {
        tracing::debug!(
            program = %self.program.display(),
            bitrate = %self.bitrate,
            format = %self.format,
            "running encoder"
        );

        let result = Command::new(&self.program)
            .args(self.args(input, output))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TranscodeError::Spawn {
                program: self.program.display().to_string(),
                source: e,
            })?;

        let stdout = String::from_utf8_lossy(&result.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
        if !stdout.is_empty() || !stderr.is_empty() {
            tracing::debug!(status = %result.status, %stdout, %stderr, "encoder output");
        }

        if !result.status.success() {
            return Err(TranscodeError::ExitStatus {
                status: result.status,
                stderr,
            });
        }
        if self.fail_on_stderr && !stderr.is_empty() {
            return Err(TranscodeError::Stderr { stderr });
        }

        let output_size = tokio::fs::metadata(output)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        if output_size == 0 {
            return Err(TranscodeError::EmptyOutput);
        }

        Ok(EncoderOutput {
            stdout,
            stderr,
            output_size,
        })
    }
}
