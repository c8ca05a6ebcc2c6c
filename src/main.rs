// RptWatch - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading (CLI flags override it)
// 3. Logging initialisation (debug mode support)
// 4. Startup scan, watch source, and the monitor loop

use clap::Parser;
use crossterm::tty::IsTty;
use rptwatch::app::monitor::Monitor;
use rptwatch::app::tail::TailReader;
use rptwatch::app::watch::{event_channel, WatchSource};
use rptwatch::core::discovery;
use rptwatch::core::encoding;
use rptwatch::core::model::WatchRoot;
use rptwatch::core::sink::EntrySink;
use rptwatch::core::tracker::ActiveFileTracker;
use rptwatch::platform::config::{self, AppConfig, OutputFormat, PlatformPaths};
use rptwatch::platform::fs::absolute_path;
use rptwatch::ui::console::ConsoleSink;
use rptwatch::ui::json::JsonLinesSink;
use rptwatch::util;
use rptwatch::util::error::{RptWatchError, ScanError};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rptwatch", version, about = "Live-tail the newest report file in a directory tree")]
struct Cli {
    /// Directory to watch (defaults to [watch] directory, then the current directory).
    path: Option<PathBuf>,

    /// Filename glob to include; repeat for several (default: *.rpt).
    #[arg(short = 'p', long = "pattern")]
    patterns: Vec<String>,

    /// Only watch files directly inside the directory.
    #[arg(long = "no-recursive")]
    no_recursive: bool,

    /// Text encoding of the report files (e.g. utf-8, windows-1252).
    #[arg(short = 'e', long = "encoding")]
    encoding: Option<String>,

    /// Output format: console or json.
    #[arg(long = "format")]
    format: Option<String>,

    /// Disable coloured output.
    #[arg(long = "no-color")]
    no_color: bool,

    /// Path to an alternative config.toml.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    // Config comes first: it can choose the log level and log file.
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PlatformPaths::resolve().config_file());
    let (app_config, warnings) = config::load_config(&config_path);

    util::logging::init(
        cli.debug,
        app_config.log_level.as_deref(),
        app_config.log_file.as_deref(),
    );

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        config = %config_path.display(),
        "RptWatch starting"
    );
    for warning in &warnings {
        tracing::warn!("{warning}");
    }

    if let Err(e) = run(cli, app_config) {
        tracing::error!(error = %e, "Fatal error");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Apply CLI overrides, then scan, watch, and tail until a fatal error.
fn run(cli: Cli, mut app_config: AppConfig) -> Result<(), RptWatchError> {
    if !cli.patterns.is_empty() {
        app_config.include_patterns = cli.patterns;
    }
    if cli.no_recursive {
        app_config.recursive = false;
    }
    if cli.encoding.is_some() {
        app_config.encoding = cli.encoding;
    }
    if let Some(ref format) = cli.format {
        app_config.output_format = OutputFormat::parse(format).ok_or_else(|| {
            util::error::ConfigError::ValueOutOfRange {
                field: "--format".to_string(),
                value: format.clone(),
                expected: "console or json".to_string(),
            }
        })?;
    }
    if cli.no_color {
        app_config.color = false;
    }

    let requested = cli
        .path
        .or_else(|| app_config.directory.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let dir = absolute_path(&requested).map_err(|source| ScanError::Io {
        path: requested.clone(),
        source,
    })?;

    let root = WatchRoot::new(
        dir,
        &app_config.include_patterns,
        &app_config.exclude_patterns,
        app_config.recursive,
        app_config.max_depth,
    )?;
    let encoding_label = app_config.encoding_label();
    let text_encoding = encoding::resolve(&encoding_label)?;

    tracing::info!(
        root = %root.dir.display(),
        patterns = ?app_config.include_patterns,
        recursive = root.recursive,
        encoding = text_encoding.name(),
        "Watch configuration"
    );

    // The watcher is registered before the scan, so a report created while
    // the scan runs is queued as a Created event and preempts the scan
    // result. The root is checked first to report a missing directory as a
    // scan error rather than a watcher failure.
    discovery::check_root(&root.dir)?;
    let (sender, events, signal) = event_channel();
    let _source = WatchSource::start(&root, sender)?;

    let initial = discovery::find_latest(&root)?;

    let sink: Box<dyn EntrySink> = match app_config.output_format {
        OutputFormat::Console => {
            let colour = app_config.color && std::io::stdout().is_tty();
            Box::new(ConsoleSink::stdout(colour))
        }
        OutputFormat::Json => Box::new(JsonLinesSink::stdout()),
    };

    let mut monitor = Monitor::new(
        ActiveFileTracker::new(root),
        TailReader::new(app_config.tail_config()),
        text_encoding,
        signal,
        sink,
    )
    .with_read_on_switch(app_config.read_on_switch);

    monitor.start(initial)?;
    monitor.run(events)
}
