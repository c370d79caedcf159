//! Logging setup
//!
//! Console output goes through `tracing-subscriber` with an `EnvFilter`
//! (`RUST_LOG`, default `probewatch=info`). File logging is opt-in with
//! `PROBEWATCH_LOG_FILE=1`; the file lives in `PROBEWATCH_LOG_DIR` (default
//! `./logs`) and is rotated to `.log.bak` once it passes 10 MiB.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;
const LOG_FILE_NAME: &str = "probewatch.log";
const DEFAULT_FILTER: &str = "probewatch=info";

/// Append-only log file that moves itself aside when it grows too large
pub struct RotatingFile {
    path: PathBuf,
    file: File,
    written: u64,
    max_bytes: u64,
}

impl RotatingFile {
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64) -> io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata().map(|m| m.len()).unwrap_or(0);
        Ok(Self {
            path,
            file,
            written,
            max_bytes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn backup_path(&self) -> PathBuf {
        self.path.with_extension("log.bak")
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        let backup = self.backup_path();
        let _ = fs::remove_file(&backup);
        fs::rename(&self.path, &backup)?;
        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn log_file_from_env() -> Option<RotatingFile> {
    let enabled = std::env::var("PROBEWATCH_LOG_FILE")
        .map(|v| v == "1")
        .unwrap_or(false);
    if !enabled {
        return None;
    }

    let dir = std::env::var("PROBEWATCH_LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("logs"));
    if let Err(e) = fs::create_dir_all(&dir) {
        eprintln!("[logger] cannot create {}: {}", dir.display(), e);
        return None;
    }

    match RotatingFile::open(dir.join(LOG_FILE_NAME), MAX_LOG_BYTES) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("[logger] cannot open log file in {}: {}", dir.display(), e);
            None
        }
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file_layer = log_file_from_env().map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_rotating_file_moves_full_log_aside() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("probe.log");
        let mut file = RotatingFile::open(&path, 16).unwrap();

        file.write_all(b"0123456789").unwrap();
        file.write_all(b"abcdefghij").unwrap();
        file.flush().unwrap();

        let backup = fs::read_to_string(dir.path().join("probe.log.bak")).unwrap();
        let current = fs::read_to_string(&path).unwrap();
        assert_eq!(backup, "0123456789");
        assert_eq!(current, "abcdefghij");
    }

    #[test]
    fn test_rotating_file_resumes_size_of_existing_log() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("probe.log");
        fs::write(&path, b"existing-content").unwrap();

        let mut file = RotatingFile::open(&path, 20).unwrap();
        assert_eq!(file.path(), path.as_path());
        file.write_all(b"more-bytes").unwrap();
        file.flush().unwrap();

        assert!(dir.path().join("probe.log.bak").exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "more-bytes");
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
    }
}
