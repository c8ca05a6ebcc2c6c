// RptWatch - platform/fs.rs
//
// Filesystem helpers whose behaviour differs per platform.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Open `path` for reading without blocking a concurrent writer.
///
/// On Windows the share mode is set explicitly to read | write | delete so
/// the application producing the report can keep appending, and can rotate
/// or delete the file, while it is open here. Unix has no mandatory sharing
/// locks, so a plain read-only open is already shared.
pub fn open_shared(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true);

    #[cfg(windows)]
    {
        use std::os::windows::fs::OpenOptionsExt;
        const FILE_SHARE_READ: u32 = 0x0000_0001;
        const FILE_SHARE_WRITE: u32 = 0x0000_0002;
        const FILE_SHARE_DELETE: u32 = 0x0000_0004;
        options.share_mode(FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE);
    }

    options.open(path)
}

/// Make `path` absolute against the current directory without resolving
/// symlinks, so watch events (which carry paths built from the watched
/// directory) compare equal to paths found by the scan.
pub fn absolute_path(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
