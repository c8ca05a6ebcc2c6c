// RptWatch - platform/config.rs
//
// Config directory resolution and config.toml loading with startup
// validation. Invalid values never stop the program: each one produces a
// warning and falls back to its default.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::app::tail::TailConfig;
use crate::core::encoding;
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved platform paths for RptWatch configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/rptwatch/ or %APPDATA%\RptWatch\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml shape
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored so a newer config file still loads in
/// an older binary.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub watch: WatchSection,
    pub tail: TailSection,
    pub output: OutputSection,
    pub logging: LoggingSection,
}

/// `[watch]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct WatchSection {
    /// Directory to watch when none is given on the command line.
    pub directory: Option<String>,
    /// Include glob patterns, matched against file names.
    pub patterns: Option<Vec<String>>,
    /// Exclude glob patterns, matched against file and directory names.
    pub exclude_patterns: Option<Vec<String>>,
    pub recursive: Option<bool>,
    /// Maximum directory depth of the startup scan.
    pub max_depth: Option<usize>,
}

/// `[tail]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct TailSection {
    pub retry_delay_ms: Option<u64>,
    pub max_read_bytes: Option<usize>,
    /// 0 disables the timeout.
    pub dead_file_timeout_secs: Option<u64>,
    /// WHATWG encoding label, e.g. "utf-8" or "windows-1252".
    pub encoding: Option<String>,
    pub read_on_switch: Option<bool>,
}

/// `[output]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// "console" or "json".
    pub format: Option<String>,
    pub color: Option<bool>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
    /// Log file path (empty = stderr only).
    pub file: Option<String>,
}

// =============================================================================
// Validated configuration
// =============================================================================

/// How entries are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Console,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "console" => Some(Self::Console),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Validated application configuration derived from `config.toml`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- Watch --
    pub directory: Option<PathBuf>,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub recursive: bool,
    pub max_depth: usize,

    // -- Tail --
    pub retry_delay_ms: u64,
    pub max_read_bytes: usize,
    pub dead_file_timeout_secs: u64,
    /// Validated encoding label; `None` means the host default.
    pub encoding: Option<String>,
    pub read_on_switch: bool,

    // -- Output --
    pub output_format: OutputFormat,
    pub color: bool,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            directory: None,
            include_patterns: to_strings(constants::DEFAULT_INCLUDE_PATTERNS),
            exclude_patterns: to_strings(constants::DEFAULT_EXCLUDE_PATTERNS),
            recursive: constants::DEFAULT_RECURSIVE,
            max_depth: constants::DEFAULT_MAX_DEPTH,
            retry_delay_ms: constants::DEFAULT_TAIL_RETRY_DELAY_MS,
            max_read_bytes: constants::DEFAULT_MAX_TAIL_READ_BYTES,
            dead_file_timeout_secs: constants::DEFAULT_DEAD_FILE_TIMEOUT_SECS,
            encoding: None,
            read_on_switch: constants::DEFAULT_READ_ON_SWITCH,
            output_format: OutputFormat::default(),
            color: true,
            log_level: None,
            log_file: None,
        }
    }
}

impl AppConfig {
    /// Tail reader settings.
    pub fn tail_config(&self) -> TailConfig {
        TailConfig {
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            max_read_bytes: self.max_read_bytes,
            dead_file_timeout: match self.dead_file_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }

    /// The configured encoding label, or the host default.
    pub fn encoding_label(&self) -> String {
        self.encoding
            .clone()
            .unwrap_or_else(encoding::host_default_label)
    }
}

fn to_strings(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| p.to_string()).collect()
}

// =============================================================================
// Loading and validation
// =============================================================================

/// Load and validate a config file.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// A missing file yields defaults with no warnings (first run). An unreadable
/// or unparseable file yields defaults and one warning.
///
/// Called before logging is initialised (the file decides the log level),
/// so problems are returned rather than logged.
pub fn load_config(path: &Path) -> (AppConfig, Vec<String>) {
    if !path.exists() {
        return (AppConfig::default(), Vec::new());
    }

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(source) => {
            let e = ConfigError::Io {
                path: path.to_path_buf(),
                source,
            };
            return (AppConfig::default(), vec![format!("{e}. Using defaults.")]);
        }
    };

    match toml::from_str::<RawConfig>(&content) {
        Ok(raw) => validate(raw),
        Err(source) => {
            let e = ConfigError::TomlParse {
                path: path.to_path_buf(),
                source,
            };
            (AppConfig::default(), vec![format!("{e}. Using defaults.")])
        }
    }
}

/// Check every field of a parsed config against the limits in `constants`,
/// accumulating all problems rather than stopping at the first.
pub fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut config = AppConfig::default();
    let mut warnings: Vec<String> = Vec::new();

    // -- Watch --
    if let Some(dir) = raw.watch.directory.filter(|d| !d.trim().is_empty()) {
        config.directory = Some(PathBuf::from(dir));
    }

    if let Some(patterns) = raw.watch.patterns {
        match check_patterns(&patterns) {
            Ok(()) if !patterns.is_empty() => config.include_patterns = patterns,
            Ok(()) => warnings.push(
                "[watch] patterns is empty; nothing would ever match. Using default (*.rpt)."
                    .to_string(),
            ),
            Err(e) => warnings.push(format!("[watch] {e}. Using default patterns.")),
        }
    }

    if let Some(patterns) = raw.watch.exclude_patterns {
        match check_patterns(&patterns) {
            Ok(()) => config.exclude_patterns = patterns,
            Err(e) => warnings.push(format!("[watch] {e}. Using default exclude patterns.")),
        }
    }

    if let Some(recursive) = raw.watch.recursive {
        config.recursive = recursive;
    }

    if let Some(depth) = raw.watch.max_depth {
        if (1..=constants::ABSOLUTE_MAX_DEPTH).contains(&depth) {
            config.max_depth = depth;
        } else {
            warnings.push(out_of_range(
                "watch.max_depth",
                depth,
                format!("1-{}", constants::ABSOLUTE_MAX_DEPTH),
                constants::DEFAULT_MAX_DEPTH,
            ));
        }
    }

    // -- Tail --
    if let Some(ms) = raw.tail.retry_delay_ms {
        if (constants::MIN_TAIL_RETRY_DELAY_MS..=constants::MAX_TAIL_RETRY_DELAY_MS).contains(&ms)
        {
            config.retry_delay_ms = ms;
        } else {
            warnings.push(out_of_range(
                "tail.retry_delay_ms",
                ms,
                format!(
                    "{}-{}",
                    constants::MIN_TAIL_RETRY_DELAY_MS,
                    constants::MAX_TAIL_RETRY_DELAY_MS
                ),
                constants::DEFAULT_TAIL_RETRY_DELAY_MS,
            ));
        }
    }

    if let Some(bytes) = raw.tail.max_read_bytes {
        if (constants::MIN_MAX_TAIL_READ_BYTES..=constants::ABSOLUTE_MAX_TAIL_READ_BYTES)
            .contains(&bytes)
        {
            config.max_read_bytes = bytes;
        } else {
            warnings.push(out_of_range(
                "tail.max_read_bytes",
                bytes,
                format!(
                    "{}-{}",
                    constants::MIN_MAX_TAIL_READ_BYTES,
                    constants::ABSOLUTE_MAX_TAIL_READ_BYTES
                ),
                constants::DEFAULT_MAX_TAIL_READ_BYTES,
            ));
        }
    }

    if let Some(secs) = raw.tail.dead_file_timeout_secs {
        if secs <= constants::MAX_DEAD_FILE_TIMEOUT_SECS {
            config.dead_file_timeout_secs = secs;
        } else {
            warnings.push(out_of_range(
                "tail.dead_file_timeout_secs",
                secs,
                format!("0-{}", constants::MAX_DEAD_FILE_TIMEOUT_SECS),
                constants::DEFAULT_DEAD_FILE_TIMEOUT_SECS,
            ));
        }
    }

    if let Some(label) = raw.tail.encoding.filter(|l| !l.trim().is_empty()) {
        match encoding::resolve(&label) {
            Ok(_) => config.encoding = Some(label),
            Err(e) => warnings.push(format!("[tail] {e}. Using the host default encoding.")),
        }
    }

    if let Some(read) = raw.tail.read_on_switch {
        config.read_on_switch = read;
    }

    // -- Output --
    if let Some(ref format) = raw.output.format {
        match OutputFormat::parse(format) {
            Some(f) => config.output_format = f,
            None => warnings.push(format!(
                "[output] format = \"{format}\" is not recognised. \
                 Expected \"console\" or \"json\". Using default (console).",
            )),
        }
    }

    if let Some(color) = raw.output.color {
        config.color = color;
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    // -- Logging: file --
    if let Some(ref file) = raw.logging.file {
        if !file.is_empty() {
            config.log_file = Some(PathBuf::from(file));
        }
    }

    (config, warnings)
}

fn check_patterns(patterns: &[String]) -> Result<(), ConfigError> {
    for pattern in patterns {
        glob::Pattern::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
    }
    Ok(())
}

fn out_of_range(
    field: &str,
    value: impl ToString,
    expected: String,
    default: impl std::fmt::Display,
) -> String {
    let e = ConfigError::ValueOutOfRange {
        field: field.to_string(),
        value: value.to_string(),
        expected,
    };
    format!("{e}. Using default ({default}).")
}
