// RptWatch - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "RptWatch";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "RptWatch";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Watch root defaults
// =============================================================================

/// Default include glob patterns (filename only) for report files.
pub const DEFAULT_INCLUDE_PATTERNS: &[&str] = &["*.rpt"];

/// Default exclude glob patterns, matched against file AND directory names.
/// Excluded directories are never descended into.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &["*.bak", "*.tmp", ".git"];

/// Subdirectories are watched and scanned by default.
pub const DEFAULT_RECURSIVE: bool = true;

/// Maximum directory recursion depth for the initial scan.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Hard upper bound on max depth (prevents runaway traversal).
pub const ABSOLUTE_MAX_DEPTH: usize = 50;

// =============================================================================
// Tail reader limits
// =============================================================================

/// Fixed delay between attempts when the active file is locked, missing, or
/// otherwise unreadable (ms).
pub const DEFAULT_TAIL_RETRY_DELAY_MS: u64 = 50;

/// Minimum user-configurable retry delay (ms).
pub const MIN_TAIL_RETRY_DELAY_MS: u64 = 10;

/// Maximum user-configurable retry delay (ms).
pub const MAX_TAIL_RETRY_DELAY_MS: u64 = 1_000;

/// Maximum bytes consumed by a single read call. A tail cycle keeps reading
/// until it reaches end-of-file; this only bounds each buffer.
pub const DEFAULT_MAX_TAIL_READ_BYTES: usize = 512 * 1024; // 512 KiB

/// Minimum user-configurable read size.
pub const MIN_MAX_TAIL_READ_BYTES: usize = 4 * 1024;

/// Maximum user-configurable read size.
pub const ABSOLUTE_MAX_TAIL_READ_BYTES: usize = 64 * 1024 * 1024;

/// Dead-file timeout (seconds). 0 disables the timeout, so the reader retries
/// until the epoch is superseded.
pub const DEFAULT_DEAD_FILE_TIMEOUT_SECS: u64 = 0;

/// Maximum user-configurable dead-file timeout (seconds).
pub const MAX_DEAD_FILE_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Catch up on content already present in a file when it becomes active.
pub const DEFAULT_READ_ON_SWITCH: bool = true;

/// Encoding label used on Windows hosts when none is configured.
pub const WINDOWS_DEFAULT_ENCODING: &str = "windows-1252";

/// Encoding label used when the host locale names no charset.
pub const FALLBACK_ENCODING: &str = "utf-8";

// =============================================================================
// Classification keywords (matched case-insensitively)
// =============================================================================

/// Keywords that mark an entry as an error. Checked before warnings.
pub const ERROR_KEYWORDS: &[&str] = &["error", "file", "context"];

/// Keywords that mark an entry as a warning.
pub const WARNING_KEYWORDS: &[&str] = &["warning", "fail", "not found", "missing"];

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Maximum length of entry text included in debug output.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
