use std::{fs, io, path::Path};

use tracing::debug;

/// Removes whatever a previous run pinned under `path`.
///
/// Best-effort: a missing directory is the normal case and any other error is
/// only logged.
pub fn remove_stale(path: &Path) {
    match fs::remove_dir_all(path) {
        Ok(()) => debug!(path = %path.display(), "removed stale pin directory"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => debug!(path = %path.display(), error = %err, "could not remove pin directory"),
    }
}
