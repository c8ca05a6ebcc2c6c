// RptWatch - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Only systemic failures (scan of the root, death of the watch source, a
// closed output) reach the top level; per-read failures are absorbed inside
// the tail reader and never appear here.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all RptWatch operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum RptWatchError {
    /// The initial directory scan could not access the watch root.
    Scan(ScanError),

    /// The filesystem notification source failed.
    Watch(WatchError),

    /// Configuration loading failed.
    Config(ConfigError),

    /// The output sink could not be written.
    Sink(SinkError),
}

impl fmt::Display for RptWatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scan(e) => write!(f, "Scan error: {e}"),
            Self::Watch(e) => write!(f, "Watch error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Sink(e) => write!(f, "Output error: {e}"),
        }
    }
}

impl std::error::Error for RptWatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Scan(e) => Some(e),
            Self::Watch(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Sink(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Scan errors
// ---------------------------------------------------------------------------

/// Errors from the one-shot startup scan. All of them concern the root
/// directory; unreadable files below the root are skipped, not reported.
#[derive(Debug)]
pub enum ScanError {
    /// The root path does not exist.
    RootNotFound { path: PathBuf },

    /// The root path is not a directory.
    NotADirectory { path: PathBuf },

    /// Permission denied accessing the root path.
    PermissionDenied { path: PathBuf, source: io::Error },

    /// Any other I/O failure while inspecting the root.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootNotFound { path } => {
                write!(f, "Watch directory '{}' does not exist", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "Watch path '{}' is not a directory", path.display())
            }
            Self::PermissionDenied { path, source } => {
                write!(
                    f,
                    "Permission denied accessing '{}': {source}",
                    path.display()
                )
            }
            Self::Io { path, source } => {
                write!(f, "Cannot access '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PermissionDenied { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ScanError> for RptWatchError {
    fn from(e: ScanError) -> Self {
        Self::Scan(e)
    }
}

// ---------------------------------------------------------------------------
// Watch errors
// ---------------------------------------------------------------------------

/// Failures of the filesystem notification source. Every variant is fatal:
/// without notifications there is no way to learn about new content.
#[derive(Debug)]
pub enum WatchError {
    /// The notifier could not be created or could not register the root.
    Init {
        path: PathBuf,
        source: notify::Error,
    },

    /// The notifier reported an error after it was started.
    Notifier { source: notify::Error },

    /// The watch root itself was removed.
    RootRemoved { path: PathBuf },

    /// The event channel closed; the notifier thread is gone.
    Disconnected,
}

impl fmt::Display for WatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init { path, source } => {
                write!(f, "Cannot watch '{}': {source}", path.display())
            }
            Self::Notifier { source } => write!(f, "Filesystem watcher failed: {source}"),
            Self::RootRemoved { path } => {
                write!(f, "Watch directory '{}' was removed", path.display())
            }
            Self::Disconnected => write!(f, "Filesystem watcher stopped delivering events"),
        }
    }
}

impl std::error::Error for WatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Init { source, .. } => Some(source),
            Self::Notifier { source } => Some(source),
            _ => None,
        }
    }
}

impl From<WatchError> for RptWatchError {
    fn from(e: WatchError) -> Self {
        Self::Watch(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// The configured text encoding label is not recognised.
    UnknownEncoding { label: String },

    /// A filename glob pattern is invalid.
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::UnknownEncoding { label } => {
                write!(f, "Unknown text encoding '{label}'")
            }
            Self::InvalidPattern { pattern, source } => {
                write!(f, "Invalid file pattern '{pattern}': {source}")
            }
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::InvalidPattern { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for RptWatchError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Sink errors
// ---------------------------------------------------------------------------

/// The rendering collaborator could not write its output.
#[derive(Debug)]
pub enum SinkError {
    /// Writing to the output device failed (e.g. a closed pipe).
    Io { source: io::Error },

    /// JSON serialisation of an event failed.
    Json { source: serde_json::Error },
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { source } => write!(f, "write failed: {source}"),
            Self::Json { source } => write!(f, "JSON encoding failed: {source}"),
        }
    }
}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source } => Some(source),
            Self::Json { source } => Some(source),
        }
    }
}

impl From<io::Error> for SinkError {
    fn from(source: io::Error) -> Self {
        Self::Io { source }
    }
}

impl From<serde_json::Error> for SinkError {
    fn from(source: serde_json::Error) -> Self {
        Self::Json { source }
    }
}

impl From<SinkError> for RptWatchError {
    fn from(e: SinkError) -> Self {
        Self::Sink(e)
    }
}

/// Convenience type alias for RptWatch results.
pub type Result<T> = std::result::Result<T, RptWatchError>;
