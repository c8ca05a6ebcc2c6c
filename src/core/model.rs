// RptWatch - core/model.rs
//
// Core data model types shared by every layer: the watch root and its
// filename filter, the active-file record, watch events, and classified
// log entries.

use crate::util::error::ConfigError;
use chrono::{DateTime, Utc};
use glob::Pattern;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

// =============================================================================
// Watch root
// =============================================================================

/// The directory tree being observed plus the rules deciding which files in
/// it are report files. Built once at startup and never modified.
#[derive(Debug, Clone)]
pub struct WatchRoot {
    /// Root directory.
    pub dir: PathBuf,
    /// Filename globs a file must match (any of).
    include: Vec<Pattern>,
    /// Globs matched against the file name and every directory name between
    /// the root and the file. A match excludes the file.
    exclude: Vec<Pattern>,
    /// Whether files in subdirectories are considered.
    pub recursive: bool,
    /// Maximum scan depth when recursive.
    pub max_depth: usize,
}

impl WatchRoot {
    /// Compile the include/exclude patterns.
    ///
    /// An empty include list accepts every file that is not excluded.
    pub fn new(
        dir: PathBuf,
        include_patterns: &[String],
        exclude_patterns: &[String],
        recursive: bool,
        max_depth: usize,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            dir,
            include: compile_patterns(include_patterns)?,
            exclude: compile_patterns(exclude_patterns)?,
            recursive,
            max_depth,
        })
    }

    /// Effective traversal depth: 1 (direct children) when not recursive.
    pub fn scan_depth(&self) -> usize {
        if self.recursive {
            self.max_depth.max(1)
        } else {
            1
        }
    }

    /// Whether a directory or file name is excluded by an exclude pattern.
    pub fn is_excluded_name(&self, name: &str) -> bool {
        self.exclude.iter().any(|p| p.matches(name))
    }

    /// Whether a file name alone satisfies the include patterns.
    pub fn includes_name(&self, name: &str) -> bool {
        self.include.is_empty() || self.include.iter().any(|p| p.matches(name))
    }

    /// Whether `path` names a report file inside this root.
    ///
    /// Purely lexical: the file is not touched. Paths outside the root, in a
    /// subdirectory of a non-recursive root, or below an excluded directory
    /// never match.
    pub fn matches(&self, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(&self.dir) else {
            return false;
        };

        let names: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(n) => Some(n.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        let Some((file_name, parents)) = names.split_last() else {
            return false;
        };

        if !self.recursive && !parents.is_empty() {
            return false;
        }

        if parents.iter().any(|d| self.is_excluded_name(d)) {
            return false;
        }

        self.includes_name(file_name) && !self.is_excluded_name(file_name)
    }

    /// Name shown to the user when `path` becomes active: the path relative
    /// to the root, or the bare file name when it lies elsewhere.
    pub fn display_name(&self, path: &Path) -> String {
        match path.strip_prefix(&self.dir) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel.display().to_string(),
            _ => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        }
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|source| ConfigError::InvalidPattern {
                pattern: p.clone(),
                source,
            })
        })
        .collect()
}

// =============================================================================
// Scan candidates
// =============================================================================

/// A matching file seen during the startup scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
}

// =============================================================================
// Active file
// =============================================================================

/// The file currently being tailed.
///
/// Values are never mutated: the tracker replaces its record on every switch
/// and every committed read, so a copy handed to the reader is a stable
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveFile {
    /// Path of the file.
    pub path: PathBuf,
    /// Bytes already read. A trailing partial multi-byte sequence is
    /// counted here while the decoder holds it back until the rest arrives.
    pub offset: u64,
    /// Generation of tracking; incremented on every switch.
    pub epoch: u64,
}

impl ActiveFile {
    /// A fresh record for a newly selected file.
    pub fn new(path: PathBuf, epoch: u64) -> Self {
        Self {
            path,
            offset: 0,
            epoch,
        }
    }

    /// The same file and epoch with a different consumed offset.
    pub fn with_offset(&self, offset: u64) -> Self {
        Self {
            path: self.path.clone(),
            offset,
            epoch: self.epoch,
        }
    }
}

// =============================================================================
// Watch events
// =============================================================================

/// What happened to a watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WatchEventKind {
    Created,
    Modified,
}

/// One notification from the watch source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    pub path: PathBuf,
}

impl WatchEvent {
    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: WatchEventKind::Created,
            path: path.into(),
        }
    }

    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: WatchEventKind::Modified,
            path: path.into(),
        }
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Keyword-derived classification of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub enum Severity {
    #[default]
    Normal,
    Warning,
    Error,
}

impl Severity {
    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Normal => "Normal",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Log entry
// =============================================================================

/// One timestamp-delimited span of text and its severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Raw text, including the trailing newline when present.
    pub text: String,
    pub severity: Severity,
}
