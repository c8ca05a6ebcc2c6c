// RptWatch - tests/e2e_tail.rs
//
// End-to-end tests for the scan -> watch -> tail pipeline.
//
// These run against the real filesystem through the public library API.
// Watch events are injected through the same `EventSender` the notifier
// uses, which keeps ordering deterministic. The last few tests drive the
// real notifier for creation, rename, and startup ordering.

use rptwatch::app::monitor::Monitor;
use rptwatch::app::tail::{TailConfig, TailReader};
use rptwatch::app::watch::{event_channel, WatchMessage, WatchSource};
use rptwatch::core::discovery;
use rptwatch::core::model::{Severity, WatchEvent, WatchEventKind, WatchRoot};
use rptwatch::core::sink::{MemorySink, SinkEvent};
use rptwatch::core::tracker::{ActiveFileTracker, SwitchSignal};
use rptwatch::util::error::{RptWatchError, ScanError, WatchError};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

// =============================================================================
// Helpers
// =============================================================================

fn root(dir: &Path) -> WatchRoot {
    WatchRoot::new(
        dir.to_path_buf(),
        &["*.rpt".to_string()],
        &["*.bak".to_string()],
        true,
        10,
    )
    .unwrap()
}

fn monitor(dir: &Path, signal: SwitchSignal) -> Monitor<MemorySink> {
    let reader = TailReader::new(TailConfig {
        retry_delay: Duration::from_millis(10),
        max_read_bytes: 4096,
        dead_file_timeout: None,
    });
    Monitor::new(
        ActiveFileTracker::new(root(dir)),
        reader,
        encoding_rs::UTF_8,
        signal,
        MemorySink::new(),
    )
}

fn write_aged(path: &Path, content: &str, age_secs: u64) {
    fs::write(path, content).unwrap();
    let when = SystemTime::now() - Duration::from_secs(age_secs);
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(when)
        .unwrap();
}

fn append(path: &Path, text: &str) {
    let mut f = OpenOptions::new().append(true).open(path).unwrap();
    f.write_all(text.as_bytes()).unwrap();
}

// =============================================================================
// Pipeline E2E
// =============================================================================

/// The newest report in the tree is tailed from the start, then appends
/// follow in order and the channel closing ends the run.
#[test]
fn e2e_tails_newest_report_then_follows_appends() {
    let dir = TempDir::new().expect("tmpdir");
    fs::create_dir(dir.path().join("nightly")).unwrap();
    write_aged(&dir.path().join("old.rpt"), "09:00:00 old run\n", 3600);
    write_aged(&dir.path().join("newer.rpt.bak"), "backup\n", 0);
    let newest = dir.path().join("nightly").join("run.rpt");
    write_aged(&newest, "10:00:00 start\n", 10);

    let root_cfg = root(dir.path());
    let initial = discovery::find_latest(&root_cfg).unwrap();
    assert_eq!(initial.as_deref(), Some(newest.as_path()));

    let (sender, events, signal) = event_channel();
    let mut m = monitor(dir.path(), signal);
    m.start(initial).unwrap();

    append(&newest, "10:00:01 Warning: disk missing\n10:00:02 Error in context\n");
    sender.send_event(WatchEvent::modified(&newest));
    // A report elsewhere changing must not be read.
    append(&dir.path().join("old.rpt"), "09:00:01 late\n");
    sender.send_event(WatchEvent::modified(dir.path().join("old.rpt")));
    drop(sender);

    let err = m.run(events).unwrap_err();
    assert!(matches!(err, RptWatchError::Watch(WatchError::Disconnected)));

    let expected_name = Path::new("nightly").join("run.rpt");
    assert_eq!(
        m.sink().events,
        vec![
            SinkEvent::Switched(expected_name.to_string_lossy().into_owned()),
            SinkEvent::Entry("10:00:00 start\n".to_string(), Severity::Normal),
            SinkEvent::Entry(
                "10:00:01 Warning: disk missing\n".to_string(),
                Severity::Warning
            ),
            SinkEvent::Entry("10:00:02 Error in context\n".to_string(), Severity::Error),
        ]
    );
}

/// A report created while the active one is unreadable wins: the stuck read
/// gives up and the new file is tailed from offset 0.
#[test]
fn e2e_new_report_interrupts_retrying_read() {
    let dir = TempDir::new().expect("tmpdir");
    let first = dir.path().join("a.rpt");
    fs::write(&first, "08:00:00 a\n").unwrap();

    let (sender, events, signal) = event_channel();
    let mut m = monitor(dir.path(), signal);
    m.start(Some(first.clone())).unwrap();

    // The active file disappears; its next read retries indefinitely.
    fs::remove_file(&first).unwrap();
    sender.send_event(WatchEvent::modified(&first));

    let second = dir.path().join("b.rpt");
    let writer = {
        let second = second.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(150));
            fs::write(&second, "08:05:00 b starts\n").unwrap();
            sender.send_event(WatchEvent::created(&second));
        })
    };

    let err = m.run(events).unwrap_err();
    writer.join().unwrap();

    assert!(matches!(err, RptWatchError::Watch(WatchError::Disconnected)));
    assert_eq!(m.sink().switches(), vec!["a.rpt", "b.rpt"]);
    assert_eq!(m.sink().text(), "08:00:00 a\n08:05:00 b starts\n");
    let active = m.tracker().active().unwrap();
    assert_eq!(active.path, second);
    assert_eq!(active.offset, "08:05:00 b starts\n".len() as u64);
}

/// An empty tree has nothing to tail until a report is created.
#[test]
fn e2e_empty_tree_waits_for_first_report() {
    let dir = TempDir::new().expect("tmpdir");
    let root_cfg = root(dir.path());
    assert_eq!(discovery::find_latest(&root_cfg).unwrap(), None);

    let (sender, events, signal) = event_channel();
    let mut m = monitor(dir.path(), signal);
    m.start(None).unwrap();
    assert!(m.sink().events.is_empty());

    let report = dir.path().join("first.rpt");
    fs::write(&report, "07:00:00 hello\n").unwrap();
    sender.send_event(WatchEvent::created(&report));
    sender.send_failure(WatchError::RootRemoved {
        path: dir.path().to_path_buf(),
    });

    let err = m.run(events).unwrap_err();
    assert!(matches!(
        err,
        RptWatchError::Watch(WatchError::RootRemoved { .. })
    ));
    assert_eq!(m.sink().switches(), vec!["first.rpt"]);
    assert_eq!(m.sink().text(), "07:00:00 hello\n");
}

/// A missing watch directory is a startup error.
#[test]
fn e2e_missing_root_is_fatal() {
    let dir = TempDir::new().expect("tmpdir");
    let err = discovery::find_latest(&root(&dir.path().join("nope"))).unwrap_err();
    assert!(matches!(err, ScanError::RootNotFound { .. }));
    let top: RptWatchError = err.into();
    assert!(top.to_string().contains("does not exist"));
}

/// The real notifier reports a newly created report as Created.
#[test]
fn e2e_notifier_reports_created_file() {
    let dir = TempDir::new().expect("tmpdir");
    // Notifiers report canonical paths on some platforms.
    let base = dir.path().canonicalize().unwrap();
    let root_cfg = root(&base);

    let (sender, events, signal) = event_channel();
    let _source = WatchSource::start(&root_cfg, sender).unwrap();

    let report = base.join("live.rpt");
    fs::write(&report, "06:00:00 x\n").unwrap();
    fs::write(base.join("ignored.txt"), "nope\n").unwrap();

    let deadline = SystemTime::now() + Duration::from_secs(10);
    let mut seen_created = false;
    while SystemTime::now() < deadline {
        match events.recv_timeout(Duration::from_millis(200)) {
            Ok(WatchMessage::Event(event)) => {
                assert_eq!(event.path, report, "non-matching path leaked: {event:?}");
                if event.kind == WatchEventKind::Created {
                    seen_created = true;
                    break;
                }
            }
            Ok(WatchMessage::Failed(e)) => panic!("watch source failed: {e}"),
            Err(_) => continue,
        }
    }
    assert!(seen_created, "no Created event for {}", report.display());
    assert!(signal.requested() >= 1);
}

/// One rename onto a report name is one switch, with the content shown once.
#[test]
fn e2e_rename_into_report_name_switches_once() {
    let dir = TempDir::new().expect("tmpdir");
    let base = dir.path().canonicalize().unwrap();
    let staging = base.join("staging.log");
    fs::write(&staging, "12:00:00 hello\n").unwrap();

    let (sender, events, signal) = event_channel();
    let _source = WatchSource::start(&root(&base), sender).unwrap();

    let report = base.join("run.rpt");
    fs::rename(&staging, &report).unwrap();

    // Drain until the notifier has been quiet for a while after the rename.
    let deadline = SystemTime::now() + Duration::from_secs(10);
    let mut received = Vec::new();
    while SystemTime::now() < deadline {
        match events.recv_timeout(Duration::from_millis(500)) {
            Ok(WatchMessage::Event(event)) => received.push(event),
            Ok(WatchMessage::Failed(e)) => panic!("watch source failed: {e}"),
            Err(_) if !received.is_empty() => break,
            Err(_) => continue,
        }
    }

    let created: Vec<_> = received
        .iter()
        .filter(|e| e.kind == WatchEventKind::Created)
        .collect();
    assert_eq!(created.len(), 1, "events: {received:?}");
    assert_eq!(created[0].path, report);
    assert_eq!(signal.requested(), 1);

    let mut m = monitor(&base, signal);
    for event in &received {
        m.handle(event).unwrap();
    }
    assert_eq!(m.sink().switches(), vec!["run.rpt"]);
    assert_eq!(m.sink().text(), "12:00:00 hello\n");
}

/// A report created after the scan but before the monitor starts takes
/// over from the scan result, because the watcher is registered first.
#[test]
fn e2e_report_created_during_startup_replaces_scan_result() {
    let dir = TempDir::new().expect("tmpdir");
    let base = dir.path().canonicalize().unwrap();
    let stale = base.join("a.rpt");
    fs::write(&stale, "11:00:00 stale\n").unwrap();
    let root_cfg = root(&base);

    discovery::check_root(&root_cfg.dir).unwrap();
    let (sender, events, signal) = event_channel();
    let _source = WatchSource::start(&root_cfg, sender).unwrap();
    let initial = discovery::find_latest(&root_cfg).unwrap();
    assert_eq!(initial.as_deref(), Some(stale.as_path()));

    let fresh = base.join("b.rpt");
    fs::write(&fresh, "11:00:05 fresh\n").unwrap();
    let deadline = SystemTime::now() + Duration::from_secs(10);
    while signal.requested() == 0 && SystemTime::now() < deadline {
        thread::sleep(Duration::from_millis(20));
    }
    assert_eq!(signal.requested(), 1);

    let mut m = monitor(&base, signal);
    m.start(initial).unwrap();
    assert!(m.tracker().active().is_none());

    while let Ok(message) = events.recv_timeout(Duration::from_millis(500)) {
        match message {
            WatchMessage::Event(event) => m.handle(&event).unwrap(),
            WatchMessage::Failed(e) => panic!("watch source failed: {e}"),
        }
    }
    assert_eq!(m.sink().switches(), vec!["b.rpt"]);
    assert_eq!(m.sink().text(), "11:00:05 fresh\n");
}
