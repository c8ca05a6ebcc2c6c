// RptWatch - core/discovery.rs
//
// One-shot startup scan: find the most recently modified report file under
// the watch root.
//
// Reads only file *metadata* (mtime), never contents.
//
// Error policy:
//   - The root itself must be an accessible directory; anything else is a
//     ScanError and fatal to the caller.
//   - Per-entry I/O errors below the root (unreadable subdirectories, files
//     deleted mid-walk, unreadable mtimes) are skipped and logged at debug.
//   - Exclude patterns short-circuit directory descent via filter_entry so
//     excluded subtrees are never traversed.

use crate::core::model::{CandidateFile, WatchRoot};
use crate::util::error::ScanError;
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};

/// Return the matching file with the newest modification time, or `None`
/// when the tree contains no report files.
///
/// Ties are broken by walk order (whichever was seen first wins).
pub fn find_latest(root: &WatchRoot) -> Result<Option<PathBuf>, ScanError> {
    let candidates = collect_candidates(root)?;
    let latest = candidates
        .into_iter()
        .reduce(|best, c| if c.modified > best.modified { c } else { best });

    match &latest {
        Some(c) => tracing::info!(
            file = %c.path.display(),
            modified = %c.modified,
            "Scan: most recent report file"
        ),
        None => tracing::info!(root = %root.dir.display(), "Scan: no report files yet"),
    }

    Ok(latest.map(|c| c.path))
}

/// Walk the root and return every matching file with a readable mtime.
pub fn collect_candidates(root: &WatchRoot) -> Result<Vec<CandidateFile>, ScanError> {
    check_root(&root.dir)?;

    let walker = walkdir::WalkDir::new(&root.dir)
        .max_depth(root.scan_depth())
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            // The root itself is never filtered, whatever its name.
            e.depth() == 0 || !root.is_excluded_name(&e.file_name().to_string_lossy())
        });

    let mut candidates = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!(error = %e, "Scan: skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_file() || !root.matches(entry.path()) {
            continue;
        }

        let modified = match entry.metadata().map_err(io::Error::from).and_then(|m| m.modified()) {
            Ok(t) => DateTime::<Utc>::from(t),
            Err(e) => {
                tracing::debug!(
                    file = %entry.path().display(),
                    error = %e,
                    "Scan: skipping file with unreadable mtime"
                );
                continue;
            }
        };

        candidates.push(CandidateFile {
            path: entry.path().to_path_buf(),
            modified,
        });
    }

    tracing::debug!(
        root = %root.dir.display(),
        count = candidates.len(),
        "Scan: candidates collected"
    );

    Ok(candidates)
}

/// Verify the root is an accessible directory.
///
/// Uses `fs::metadata` rather than `Path::is_dir` so permission failures are
/// reported as such instead of looking like a missing directory. A directory
/// that exists but cannot be listed is also a permission failure.
/// Fail unless `dir` is an existing, listable directory.
pub fn check_root(dir: &Path) -> Result<(), ScanError> {
    let meta = std::fs::metadata(dir).map_err(|e| classify_root_error(dir, e))?;
    if !meta.is_dir() {
        return Err(ScanError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }
    std::fs::read_dir(dir).map_err(|e| classify_root_error(dir, e))?;
    Ok(())
}

fn classify_root_error(dir: &Path, e: io::Error) -> ScanError {
    let path = dir.to_path_buf();
    match e.kind() {
        io::ErrorKind::NotFound => ScanError::RootNotFound { path },
        io::ErrorKind::PermissionDenied => ScanError::PermissionDenied { path, source: e },
        _ => ScanError::Io { path, source: e },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn watch_root(dir: &Path, recursive: bool) -> WatchRoot {
        WatchRoot::new(
            dir.to_path_buf(),
            &["*.rpt".to_string()],
            &[".git".to_string()],
            recursive,
            10,
        )
        .unwrap()
    }

    fn write_with_mtime(path: &Path, secs_ago: u64) {
        fs::write(path, b"12:00:00 line\n").expect("write");
        let mtime = SystemTime::now() - Duration::from_secs(secs_ago);
        fs::File::options()
            .write(true)
            .open(path)
            .and_then(|f| f.set_modified(mtime))
            .expect("set mtime");
    }

    #[test]
    fn test_find_latest_picks_newest_mtime() {
        let dir = TempDir::new().expect("tmpdir");
        write_with_mtime(&dir.path().join("old.rpt"), 3_600);
        write_with_mtime(&dir.path().join("new.rpt"), 10);
        write_with_mtime(&dir.path().join("newest.log"), 0);

        let latest = find_latest(&watch_root(dir.path(), true)).unwrap();
        assert_eq!(latest, Some(dir.path().join("new.rpt")));
    }

    #[test]
    fn test_find_latest_descends_only_when_recursive() {
        let dir = TempDir::new().expect("tmpdir");
        fs::create_dir(dir.path().join("sub")).unwrap();
        write_with_mtime(&dir.path().join("top.rpt"), 3_600);
        write_with_mtime(&dir.path().join("sub").join("deep.rpt"), 0);

        let rec = find_latest(&watch_root(dir.path(), true)).unwrap();
        assert_eq!(rec, Some(dir.path().join("sub").join("deep.rpt")));

        let flat = find_latest(&watch_root(dir.path(), false)).unwrap();
        assert_eq!(flat, Some(dir.path().join("top.rpt")));
    }

    #[test]
    fn test_find_latest_skips_excluded_directories() {
        let dir = TempDir::new().expect("tmpdir");
        fs::create_dir(dir.path().join(".git")).unwrap();
        write_with_mtime(&dir.path().join(".git").join("hidden.rpt"), 0);
        write_with_mtime(&dir.path().join("visible.rpt"), 60);

        let latest = find_latest(&watch_root(dir.path(), true)).unwrap();
        assert_eq!(latest, Some(dir.path().join("visible.rpt")));
    }

    #[test]
    fn test_find_latest_empty_tree_is_none() {
        let dir = TempDir::new().expect("tmpdir");
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        assert_eq!(find_latest(&watch_root(dir.path(), true)).unwrap(), None);
    }

    #[test]
    fn test_missing_root_is_root_not_found() {
        let dir = TempDir::new().expect("tmpdir");
        let missing = dir.path().join("does-not-exist");
        let result = find_latest(&watch_root(&missing, true));
        assert!(
            matches!(result, Err(ScanError::RootNotFound { .. })),
            "expected RootNotFound, got {result:?}"
        );
    }

    #[test]
    fn test_file_root_is_not_a_directory() {
        let dir = TempDir::new().expect("tmpdir");
        let file = dir.path().join("a.rpt");
        fs::write(&file, b"x").unwrap();
        let result = find_latest(&watch_root(&file, true));
        assert!(matches!(result, Err(ScanError::NotADirectory { .. })));
    }
}
