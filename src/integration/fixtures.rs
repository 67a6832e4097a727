//! Test fixtures for integration tests
//!
//! Provides stand-in encoders, a seeded filesystem store and a log capture,
//! so the whole handler can run without a real encoder or object store.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::config::TranscodeConfig;
use crate::store::FsStore;

/// Shell script standing in for the encoder binary.
///
/// Every variant records its arguments, one per line, next to the script.
pub struct FakeEncoder {
    path: PathBuf,
    args_path: PathBuf,
}

impl FakeEncoder {
    /// Writes `MP3:` followed by the input bytes to the output path
    pub fn copying(dir: &Path) -> Self {
        Self::write(
            dir,
            "copying-encoder",
            r#"in=""
while [ $# -gt 1 ]; do
  if [ "$1" = "-i" ]; then in="$2"; fi
  shift
done
{ printf 'MP3:'; cat "$in"; } > "$1""#,
        )
    }

    /// Exits 1 with a diagnostic and writes nothing
    pub fn failing(dir: &Path) -> Self {
        Self::write(
            dir,
            "failing-encoder",
            r#"echo "in.ogg: Invalid data found when processing input" >&2
exit 1"#,
        )
    }

    /// Produces output but also complains on stderr, exiting 0
    pub fn noisy(dir: &Path) -> Self {
        Self::write(
            dir,
            "noisy-encoder",
            r#"for last; do :; done
printf 'MP3' > "$last"
echo "Audio clipping detected" >&2"#,
        )
    }

    /// Sleeps long enough for a caller to give up on the invocation
    pub fn slow(dir: &Path) -> Self {
        Self::write(dir, "slow-encoder", "exec sleep 30")
    }

    /// Exits 0 without writing anything
    pub fn silent(dir: &Path) -> Self {
        Self::write(dir, "silent-encoder", "exit 0")
    }

    fn write(dir: &Path, name: &str, body: &str) -> Self {
        let path = dir.join(name);
        let args_path = dir.join(format!("{}.args", name));
        let script = format!(
            "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\n{}\n",
            args_path.display(),
            body
        );
        std::fs::write(&path, script).unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        Self { path, args_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Arguments of the most recent run; empty if it never ran
    pub fn recorded_args(&self) -> Vec<String> {
        std::fs::read_to_string(&self.args_path)
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// Isolated directories for one handler test
pub struct TestEnv {
    /// Holds the store root, the temp dir and the fake encoders
    pub dir: tempfile::TempDir,
    pub store: FsStore,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("store")).unwrap();
        std::fs::create_dir_all(dir.path().join("tmp")).unwrap();
        std::fs::create_dir_all(dir.path().join("bin")).unwrap();
        let store = FsStore::new(dir.path().join("store"));
        Self { dir, store }
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.dir.path().join("bin")
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.dir.path().join("tmp")
    }

    /// Transcode settings pointing at `encoder` and this environment's temp dir
    pub fn transcode_config(&self, encoder: &Path) -> TranscodeConfig {
        TranscodeConfig {
            bitrate: "128k".to_string(),
            encoder: encoder.to_path_buf(),
            temp_dir: Some(self.temp_dir()),
            ..Default::default()
        }
    }

    /// Place an object in the store
    pub fn seed(&self, bucket: &str, key: &str, content: &[u8]) {
        let path = self.store.object_path(bucket, key).unwrap();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    /// Read an object from the store, if present
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        std::fs::read(self.store.object_path(bucket, key).unwrap()).ok()
    }

    /// Entries left behind in the temp dir
    pub fn leftover_temp_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.temp_dir())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }
}

/// Collects formatted log output of the current thread
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl LogCapture {
    /// Install as the thread's default subscriber until the guard drops.
    ///
    /// Only events emitted on this thread are captured, which covers
    /// `#[tokio::test]` on its default current-thread runtime.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let buffer = self.buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || CaptureWriter(buffer.clone()))
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }

    /// Lines at the given level, e.g. "ERROR"
    pub fn lines_at(&self, level: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.contains(level))
            .map(str::to_string)
            .collect()
    }
}
