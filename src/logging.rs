use std::fs::OpenOptions;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::Level;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub const MAX_LOG_FILE_BYTES: u64 = 10 * 1024 * 1024;

pub fn init_logging(log_level: Level, log_file: Option<&str>) {
    let level_filter = LevelFilter::from_level(log_level);
    let stdout_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);

    match log_file {
        Some(path) => {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(capped_file_writer(PathBuf::from(path), MAX_LOG_FILE_BYTES));
            tracing_subscriber::registry()
                .with(stdout_layer.with_filter(level_filter))
                .with(file_layer.with_filter(level_filter))
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(stdout_layer.with_filter(level_filter))
                .init();
        }
    }
}

fn capped_file_writer(path: PathBuf, max_len: u64) -> impl Fn() -> CappedFileWriter {
    let lock = Arc::new(Mutex::new(()));
    move || CappedFileWriter { path: path.clone(), max_len, lock: lock.clone() }
}

/// Appends to a log file and, once it reaches `max_len`, keeps only the newest half.
struct CappedFileWriter {
    path: PathBuf,
    max_len: u64,
    lock: Arc<Mutex<()>>,
}

impl CappedFileWriter {
    fn truncate_to_tail(&self) -> io::Result<()> {
        let keep_bytes = self.max_len / 2;
        let mut tail = Vec::new();
        if let Ok(mut rf) = OpenOptions::new().read(true).open(&self.path) {
            let size = rf.metadata()?.len();
            rf.seek(SeekFrom::Start(size.saturating_sub(keep_bytes)))?;
            rf.read_to_end(&mut tail)?;
        }
        let mut wf = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        wf.write_all(&tail)
    }
}

impl Write for CappedFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // a poisoned lock only means another writer panicked mid-line
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let oversized = std::fs::metadata(&self.path)
            .map(|meta| meta.len() >= self.max_len)
            .unwrap_or(false);
        if oversized {
            self.truncate_to_tail()?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capped_writer_keeps_newest_half() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxy.log");
        let make_writer = capped_file_writer(path.clone(), 8);

        make_writer().write_all(b"01234567").unwrap();
        make_writer().write_all(b"89").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "456789");
    }

    #[test]
    fn test_capped_writer_appends_below_cap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxy.log");
        let make_writer = capped_file_writer(path.clone(), 1024);

        make_writer().write_all(b"first\n").unwrap();
        make_writer().write_all(b"second\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
