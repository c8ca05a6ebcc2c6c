// RptWatch - app/tail.rs
//
// Tail reader: reads the bytes appended to the active file since the last
// committed offset.
//
// Architecture:
//   - Runs synchronously on the monitor thread, inside the handling of a
//     single event. There is no background poll loop; the watch source says
//     when to read.
//   - The file is opened with a shared read handle every attempt, so the
//     producing application can keep its write handle (and rotate the file)
//     while we read.
//
// Failure policy:
//   - Every open/stat/seek/read failure is a TransientReadError. The reader
//     sleeps a fixed short delay and tries again; the producer is expected
//     to release its lock shortly, and a file that is briefly missing is
//     expected to come back.
//   - The retry loop ends only when the epoch token reports a pending switch
//     (the file is no longer wanted) or the optional dead-file timeout
//     elapses. Neither is an error for the caller.
//   - A file shorter than the tracked offset was truncated or rewritten in
//     place: the read restarts at 0 and reports the reset.
//   - `max_read_bytes` caps a single buffer; the caller loops until
//     `more` is false to reach end-of-file.

use crate::core::model::ActiveFile;
use crate::core::tracker::EpochToken;
use crate::platform::fs::open_shared;
use crate::util::constants::{
    DEFAULT_DEAD_FILE_TIMEOUT_SECS, DEFAULT_MAX_TAIL_READ_BYTES, DEFAULT_TAIL_RETRY_DELAY_MS,
};
use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::time::{Duration, Instant};

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct TailConfig {
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
    /// Upper bound on bytes returned by one read.
    pub max_read_bytes: usize,
    /// Give up on a cycle after retrying this long. `None` retries until the
    /// epoch is superseded.
    pub dead_file_timeout: Option<Duration>,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_millis(DEFAULT_TAIL_RETRY_DELAY_MS),
            max_read_bytes: DEFAULT_MAX_TAIL_READ_BYTES,
            dead_file_timeout: match DEFAULT_DEAD_FILE_TIMEOUT_SECS {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

// =============================================================================
// Results
// =============================================================================

/// Bytes read beyond the consumed offset in one read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk {
    pub bytes: Vec<u8>,
    /// Offset the read started from: the tracked offset, or 0 after truncation.
    pub start: u64,
    /// `start + bytes.len()`.
    pub new_offset: u64,
    /// The file was shorter than the tracked offset; consumption restarted at 0.
    pub truncated: bool,
    /// The read filled `max_read_bytes`; more data may follow.
    pub more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailOutcome {
    Chunk(RawChunk),
    /// A switch is pending; the epoch's read was abandoned.
    Superseded,
    /// The dead-file timeout elapsed without a successful read.
    TimedOut,
}

/// Why a read attempt failed. Absorbed by the retry loop, only logged.
#[derive(Debug)]
pub enum TransientReadError {
    /// Another process holds the file with an incompatible share mode.
    Locked(io::Error),
    /// The file does not exist right now.
    Missing(io::Error),
    /// Any other I/O failure (interrupted, device busy, decoding restart...).
    Io(io::Error),
}

impl TransientReadError {
    pub fn classify(e: io::Error) -> Self {
        // ERROR_SHARING_VIOLATION (32) / ERROR_LOCK_VIOLATION (33) on Windows.
        if cfg!(windows) && matches!(e.raw_os_error(), Some(32) | Some(33)) {
            return Self::Locked(e);
        }
        match e.kind() {
            io::ErrorKind::NotFound => Self::Missing(e),
            io::ErrorKind::WouldBlock => Self::Locked(e),
            _ => Self::Io(e),
        }
    }
}

impl fmt::Display for TransientReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locked(e) => write!(f, "file locked by another process: {e}"),
            Self::Missing(e) => write!(f, "file temporarily missing: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for TransientReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Locked(e) | Self::Missing(e) | Self::Io(e) => Some(e),
        }
    }
}

// =============================================================================
// Reader
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct TailReader {
    config: TailConfig,
}

impl TailReader {
    pub fn new(config: TailConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TailConfig {
        &self.config
    }

    /// Read from `file.offset` towards end-of-file, retrying through
    /// transient failures until success, supersession, or timeout.
    ///
    /// The token is checked before every attempt, so a pending switch ends
    /// the loop within one retry delay.
    pub fn read(&self, file: &ActiveFile, token: &EpochToken) -> TailOutcome {
        let started = Instant::now();
        let mut attempts: u64 = 0;

        loop {
            if token.is_superseded() {
                tracing::debug!(
                    file = %file.path.display(),
                    epoch = file.epoch,
                    attempts,
                    "Tail: switch pending, abandoning read"
                );
                return TailOutcome::Superseded;
            }

            match read_from(&file.path, file.offset, self.config.max_read_bytes) {
                Ok(chunk) => {
                    if attempts > 0 {
                        tracing::debug!(
                            file = %file.path.display(),
                            attempts,
                            "Tail: read succeeded after retries"
                        );
                    }
                    return TailOutcome::Chunk(chunk);
                }
                Err(e) => {
                    attempts += 1;
                    let err = TransientReadError::classify(e);
                    if attempts == 1 {
                        tracing::debug!(file = %file.path.display(), error = %err, "Tail: retrying");
                    } else {
                        tracing::trace!(file = %file.path.display(), error = %err, attempts, "Tail: retrying");
                    }

                    if let Some(limit) = self.config.dead_file_timeout {
                        if started.elapsed() >= limit {
                            tracing::warn!(
                                file = %file.path.display(),
                                attempts,
                                timeout_secs = limit.as_secs(),
                                error = %err,
                                "Tail: file unreadable past dead-file timeout, giving up this cycle"
                            );
                            return TailOutcome::TimedOut;
                        }
                    }

                    std::thread::sleep(self.config.retry_delay);
                }
            }
        }
    }
}

/// One read attempt from `offset`, at most `limit` bytes.
fn read_from(path: &Path, offset: u64, limit: usize) -> io::Result<RawChunk> {
    let mut file = open_shared(path)?;
    let len = file.metadata()?.len();

    let (start, truncated) = if len < offset {
        tracing::info!(
            file = %path.display(),
            old_offset = offset,
            new_size = len,
            "Tail: file truncated or rewritten, restarting at offset 0"
        );
        (0, true)
    } else {
        (offset, false)
    };

    file.seek(SeekFrom::Start(start))?;

    let expected = usize::try_from(len - start).unwrap_or(usize::MAX).min(limit);
    let mut bytes = Vec::with_capacity(expected);
    let read = file.take(limit as u64).read_to_end(&mut bytes)?;

    Ok(RawChunk {
        bytes,
        start,
        new_offset: start + read as u64,
        truncated,
        more: read == limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{WatchEvent, WatchRoot};
    use crate::core::tracker::{ActiveFileTracker, SwitchSignal};
    use std::fs;
    use tempfile::TempDir;

    fn fast_config() -> TailConfig {
        TailConfig {
            retry_delay: Duration::from_millis(10),
            max_read_bytes: 1024,
            dead_file_timeout: None,
        }
    }

    fn tracking(dir: &Path, name: &str) -> (ActiveFileTracker, SwitchSignal) {
        let root = WatchRoot::new(dir.to_path_buf(), &["*.rpt".to_string()], &[], true, 5).unwrap();
        let mut tracker = ActiveFileTracker::new(root);
        tracker.start(dir.join(name));
        (tracker, SwitchSignal::new())
    }

    fn expect_chunk(outcome: TailOutcome) -> RawChunk {
        match outcome {
            TailOutcome::Chunk(c) => c,
            other => panic!("expected a chunk, got {other:?}"),
        }
    }

    #[test]
    fn test_reads_only_bytes_after_offset() {
        let dir = TempDir::new().expect("tmpdir");
        let path = dir.path().join("a.rpt");
        fs::write(&path, b"12:00:00 one\n12:00:01 two\n").unwrap();

        let (tracker, signal) = tracking(dir.path(), "a.rpt");
        let file = tracker.active().unwrap().with_offset(13);
        let chunk = expect_chunk(TailReader::new(fast_config()).read(&file, &tracker.token(&signal)));

        assert_eq!(chunk.bytes, b"12:00:01 two\n");
        assert_eq!(chunk.start, 13);
        assert_eq!(chunk.new_offset, 26);
        assert!(!chunk.truncated);
        assert!(!chunk.more);
    }

    #[test]
    fn test_no_new_bytes_is_an_empty_chunk() {
        let dir = TempDir::new().expect("tmpdir");
        let path = dir.path().join("a.rpt");
        fs::write(&path, b"abc").unwrap();

        let (tracker, signal) = tracking(dir.path(), "a.rpt");
        let file = tracker.active().unwrap().with_offset(3);
        let chunk = expect_chunk(TailReader::new(fast_config()).read(&file, &tracker.token(&signal)));
        assert!(chunk.bytes.is_empty());
        assert_eq!(chunk.new_offset, 3);
    }

    #[test]
    fn test_truncated_file_restarts_at_zero() {
        let dir = TempDir::new().expect("tmpdir");
        let path = dir.path().join("a.rpt");
        fs::write(&path, b"fresh\n").unwrap();

        let (tracker, signal) = tracking(dir.path(), "a.rpt");
        let file = tracker.active().unwrap().with_offset(500);
        let chunk = expect_chunk(TailReader::new(fast_config()).read(&file, &tracker.token(&signal)));

        assert!(chunk.truncated);
        assert_eq!(chunk.start, 0);
        assert_eq!(chunk.bytes, b"fresh\n");
        assert_eq!(chunk.new_offset, 6);
    }

    #[test]
    fn test_large_tail_is_read_in_capped_pieces() {
        let dir = TempDir::new().expect("tmpdir");
        let path = dir.path().join("a.rpt");
        fs::write(&path, vec![b'x'; 2_500]).unwrap();

        let (tracker, signal) = tracking(dir.path(), "a.rpt");
        let reader = TailReader::new(fast_config());
        let token = tracker.token(&signal);

        let mut file = tracker.active().unwrap().clone();
        let mut total = 0;
        loop {
            let chunk = expect_chunk(reader.read(&file, &token));
            assert!(chunk.bytes.len() <= reader.config().max_read_bytes);
            total += chunk.bytes.len();
            file = file.with_offset(chunk.new_offset);
            if !chunk.more {
                break;
            }
        }
        assert_eq!(total, 2_500);
        assert_eq!(file.offset, 2_500);
    }

    #[test]
    fn test_missing_file_retries_until_it_appears() {
        let dir = TempDir::new().expect("tmpdir");
        let path = dir.path().join("late.rpt");

        let (tracker, signal) = tracking(dir.path(), "late.rpt");
        let file = tracker.active().unwrap().clone();
        let token = tracker.token(&signal);

        let writer_path = path.clone();
        let writer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(80));
            fs::write(writer_path, b"12:00:00 up\n").unwrap();
        });

        let chunk = expect_chunk(TailReader::new(fast_config()).read(&file, &token));
        writer.join().unwrap();
        assert_eq!(chunk.bytes, b"12:00:00 up\n");
    }

    #[test]
    fn test_pending_switch_abandons_retry_loop() {
        let dir = TempDir::new().expect("tmpdir");
        let (mut tracker, signal) = tracking(dir.path(), "gone.rpt");
        let file = tracker.active().unwrap().clone();
        let token = tracker.token(&signal);

        let source = signal.clone();
        let notifier = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(60));
            source.request();
        });

        let outcome = TailReader::new(fast_config()).read(&file, &token);
        notifier.join().unwrap();
        assert_eq!(outcome, TailOutcome::Superseded);

        // The stale epoch can no longer commit once the switch is applied.
        tracker.apply(&WatchEvent::created(dir.path().join("b.rpt")));
        assert!(!tracker.commit(file.epoch, 10));
    }

    #[test]
    fn test_dead_file_timeout_ends_cycle() {
        let dir = TempDir::new().expect("tmpdir");
        let (tracker, signal) = tracking(dir.path(), "never.rpt");
        let config = TailConfig {
            dead_file_timeout: Some(Duration::from_millis(50)),
            ..fast_config()
        };
        let outcome = TailReader::new(config).read(tracker.active().unwrap(), &tracker.token(&signal));
        assert_eq!(outcome, TailOutcome::TimedOut);
    }

    #[test]
    fn test_classify_not_found_as_missing() {
        let err = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert!(matches!(TransientReadError::classify(err), TransientReadError::Missing(_)));
    }
}
