//! Log file setup for the binary.
//!
//! One `microsteps.log` per run in the data directory. Older runs are kept
//! as `.1` (newest) through `.3` (oldest).

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "microsteps.log";
const KEPT_GENERATIONS: u32 = 3;
const DEFAULT_FILTER: &str = "microsteps=info,warn";

/// Install the global subscriber, writing under `log_dir`.
///
/// `RUST_LOG` overrides the default filter. Falls back to stderr when the
/// log file cannot be created.
pub fn init(log_dir: &Path) {
    let _ = fs::create_dir_all(log_dir);
    let log_path = log_dir.join(LOG_FILE_NAME);
    rotate(&log_path, KEPT_GENERATIONS);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => builder
            .with_writer(SyncedFile::new(file))
            .with_ansi(false)
            .init(),
        Err(e) => {
            builder.with_writer(io::stderr).init();
            tracing::warn!(error = %e, path = %log_path.display(), "log file unavailable, using stderr");
        }
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = %log_path.display(),
        pid = std::process::id(),
        "microsteps started"
    );
}

/// `microsteps.log` + 2 → `microsteps.log.2`.
fn generation(base: &Path, n: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{n}"));
    PathBuf::from(name)
}

/// Shift every kept generation up by one and move `base` to `.1`.
/// The generation past `keep` is discarded; gaps are tolerated.
fn rotate(base: &Path, keep: u32) {
    let _ = fs::remove_file(generation(base, keep));
    for n in (1..keep).rev() {
        let _ = fs::rename(generation(base, n), generation(base, n + 1));
    }
    if base.exists() {
        let _ = fs::rename(base, generation(base, 1));
    }
}

/// Shared log file, flushed after each write.
#[derive(Clone)]
struct SyncedFile(Arc<Mutex<File>>);

impl SyncedFile {
    fn new(file: File) -> Self {
        Self(Arc::new(Mutex::new(file)))
    }

    fn file(&self) -> io::Result<MutexGuard<'_, File>> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))
    }
}

impl Write for SyncedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = self.file()?;
        let written = file.write(buf)?;
        file.flush()?;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file()?.flush()
    }
}

impl<'a> MakeWriter<'a> for SyncedFile {
    type Writer = SyncedFile;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(dir: &Path, name: &str) -> String {
        fs::read_to_string(dir.join(name)).unwrap()
    }

    #[test]
    fn test_generation_appends_index() {
        let base = Path::new("/var/log/microsteps.log");
        assert_eq!(generation(base, 2), PathBuf::from("/var/log/microsteps.log.2"));
    }

    #[test]
    fn test_rotate_shifts_and_drops_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join(LOG_FILE_NAME);
        fs::write(&base, "current").unwrap();
        fs::write(generation(&base, 1), "one").unwrap();
        fs::write(generation(&base, 3), "oldest").unwrap();

        rotate(&base, 3);

        assert!(!base.exists());
        assert_eq!(read(dir.path(), "microsteps.log.1"), "current");
        assert_eq!(read(dir.path(), "microsteps.log.2"), "one");
        assert!(!generation(&base, 3).exists());
    }

    #[test]
    fn test_rotate_without_existing_log() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join(LOG_FILE_NAME);
        rotate(&base, 3);
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_synced_file_writes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let mut writer = SyncedFile::new(File::create(&path).unwrap());
        writer.write_all(b"line\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "line\n");
    }
}
