// RptWatch - util/logging.rs
//
// Structured diagnostic logging with runtime-selectable debug mode.
//
// Activation:
//   - Environment variable: RUST_LOG=debug (or trace)
//   - CLI flag: --debug
//   - Config file: [logging] level = "debug"
//
// Output: stderr by default, so diagnostics never interleave with the tailed
// content written to stdout. Optionally a file instead.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Initialise the logging subsystem.
///
/// Priority: RUST_LOG env var > CLI --debug flag > config level > default "info".
///
/// When `log_file` is set and can be opened for appending, diagnostics go to
/// that file; otherwise they go to stderr.
pub fn init(debug_flag: bool, config_level: Option<&str>, log_file: Option<&Path>) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if debug_flag {
        EnvFilter::new("debug")
    } else if let Some(level) = config_level {
        EnvFilter::new(level)
    } else {
        EnvFilter::new(super::constants::DEFAULT_LOG_LEVEL)
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .compact();

    let file = log_file.and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => Some(f),
            Err(e) => {
                eprintln!(
                    "Warning: cannot open log file '{}': {e}. Logging to stderr.",
                    path.display()
                );
                None
            }
        }
    });

    match file {
        Some(f) => builder
            .with_ansi(false)
            .with_writer(Mutex::new(f))
            .init(),
        None => builder.with_writer(std::io::stderr).init(),
    }

    tracing::debug!(
        app = super::constants::APP_NAME,
        version = super::constants::APP_VERSION,
        "Logging initialised"
    );
}
