//! # Reload Trigger
//!
//! Shiny server watches `restart.txt` inside each application directory and
//! restarts the application when its modification time advances. Touching
//! that file is the only way ACL changes reach the running application.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::error::Result;

/// Sentinel file watched by Shiny server.
pub const RESTART_FILE_NAME: &str = "restart.txt";

/// Path of the sentinel file inside `app`.
pub fn restart_file(app: &Path) -> PathBuf {
    app.join(RESTART_FILE_NAME)
}

/// Create `restart.txt` if needed and set its mtime to now.
///
/// # Errors
///
/// Any I/O failure (for example permission denied) is returned as-is.
pub fn touch(app: &Path) -> Result<()> {
    let path = restart_file(app);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    file.set_modified(SystemTime::now())?;
    debug!(path = %path.display(), "touched restart sentinel");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn touch_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path()).unwrap();
        assert!(restart_file(dir.path()).is_file());
    }

    #[test]
    fn touch_advances_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = restart_file(dir.path());
        let old = UNIX_EPOCH + Duration::from_secs(1_000_000);
        let file = std::fs::File::create(&path).unwrap();
        file.set_modified(old).unwrap();
        drop(file);

        touch(dir.path()).unwrap();
        let mtime = std::fs::metadata(&path).unwrap().modified().unwrap();
        assert!(mtime > old);
    }

    #[test]
    fn touch_keeps_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = restart_file(dir.path());
        std::fs::write(&path, "keep me").unwrap();
        touch(dir.path()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");
    }

    #[test]
    fn touch_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(touch(&dir.path().join("missing")).is_err());
    }
}
