use std::{fs, io, path::Path};

/// Removes a file, ignoring any failure.
pub fn try_remove_file<P: AsRef<Path>>(path: P) {
    let path = path.as_ref();
    if let Err(e) = fs::remove_file(path) {
        log::debug!("ignore failure to remove {path:?}: {e}");
    }
}

/// Renames `from` to `to`, ignoring any failure.
pub fn try_rename<P1: AsRef<Path>, P2: AsRef<Path>>(from: P1, to: P2) {
    let from = from.as_ref();
    let to = to.as_ref();
    if let Err(e) = fs::rename(from, to) {
        log::warn!("failed to rename {from:?} to {to:?}: {e}");
    }
}

/// Recursively removes a directory, ignoring any failure.
///
/// Returns whether the directory is gone afterwards; a missing directory
/// counts as removed.
pub fn try_remove_dir_all<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    match fs::remove_dir_all(path) {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("{path:?} already removed");
            true
        }
        Err(e) => {
            log::warn!("failed to remove {path:?}, leaving it orphaned: {e}");
            false
        }
    }
}

pub fn format_duration_short(duration: std::time::Duration) -> String {
    let s = humantime::format_duration(duration).to_string();
    s.split(' ').take(2).collect::<Vec<_>>().join(" ")
}
