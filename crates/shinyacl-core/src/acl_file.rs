//! # ACL Config File
//!
//! Reads and rewrites the `required_user` line of an application's
//! `.shiny_app.conf`. Every other line of the file is preserved verbatim
//! and in order; the file is never parsed beyond recognising that one line.
//!
//! ## Grammar
//!
//! ```text
//! required_user( <identifier>)*;
//! ```
//!
//! ## Atomicity
//!
//! Rewrites go through a temporary file in the application directory that
//! is renamed over the config file, so a crash mid-write leaves either the
//! old or the new contents on disk.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{AclError, Result};

/// Name of the per-application config file.
pub const CONFIG_FILE_NAME: &str = ".shiny_app.conf";

/// Keyword that opens the ACL line.
pub const ACL_KEYWORD: &str = "required_user";

/// Parse one line as an ACL entry.
///
/// Returns `None` when the line is not an ACL entry. The line terminator,
/// if any, is ignored. Runs of whitespace between identifiers produce no
/// empty tokens.
pub fn parse_entry(line: &str) -> Option<Vec<String>> {
    let line = line.trim_end_matches(&['\n', '\r'][..]);
    let rest = line.strip_prefix(ACL_KEYWORD)?;
    let body = rest.strip_suffix(';')?;
    // `required_users x;` is some other directive.
    if !(body.is_empty() || body.starts_with(char::is_whitespace)) {
        return None;
    }
    Some(body.split_whitespace().map(str::to_string).collect())
}

/// Render an ACL entry line, including its trailing newline.
pub fn render_entry<S: AsRef<str>>(ids: &[S]) -> String {
    let mut line = String::from(ACL_KEYWORD);
    for id in ids {
        line.push(' ');
        line.push_str(id.as_ref());
    }
    line.push_str(";\n");
    line
}

/// Extract the ACL from full file contents.
///
/// Returns the identifiers of the single ACL line (empty if there is none)
/// or the number of ACL lines found when there is more than one.
pub fn extract(contents: &str) -> std::result::Result<Vec<String>, usize> {
    let mut entries = contents.lines().filter_map(parse_entry);
    let first = entries.next();
    let extra = entries.count();
    if extra > 0 {
        return Err(extra + 1);
    }
    Ok(first.unwrap_or_default())
}

/// Compute new file contents with the ACL line replaced (or appended).
///
/// Returns the number of ACL lines found when there is more than one.
pub fn rewrite<S: AsRef<str>>(contents: &str, ids: &[S]) -> std::result::Result<String, usize> {
    let entry = render_entry(ids);
    let matches = contents
        .split_inclusive('\n')
        .filter(|l| parse_entry(l).is_some())
        .count();
    if matches > 1 {
        return Err(matches);
    }

    let mut out = String::with_capacity(contents.len() + entry.len());
    if matches == 1 {
        for line in contents.split_inclusive('\n') {
            if parse_entry(line).is_some() {
                // Keep the terminator style of the line being replaced.
                if line.ends_with("\r\n") {
                    out.push_str(entry.trim_end_matches('\n'));
                    out.push_str("\r\n");
                } else {
                    out.push_str(&entry);
                }
            } else {
                out.push_str(line);
            }
        }
    } else {
        out.push_str(contents);
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&entry);
    }
    Ok(out)
}

/// Handle on the config file of one application directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclFile {
    path: PathBuf,
}

impl AclFile {
    /// The config file inside `app`.
    pub fn for_app(app: &Path) -> Self {
        Self {
            path: app.join(CONFIG_FILE_NAME),
        }
    }

    /// Path to the config file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the ACL. A missing file reads as an empty ACL.
    ///
    /// # Errors
    ///
    /// [`AclError::MalformedConfig`] if the file holds more than one ACL
    /// line, [`AclError::Io`] for any read failure other than not-found.
    pub fn read(&self) -> Result<Vec<String>> {
        let contents = match self.read_contents()? {
            Some(c) => c,
            None => return Ok(Vec::new()),
        };
        extract(&contents).map_err(|count| self.malformed(count))
    }

    /// Replace the ACL with `ids`, preserving all other lines.
    ///
    /// # Errors
    ///
    /// [`AclError::MalformedConfig`] (nothing written) if the file holds more
    /// than one ACL line, [`AclError::Io`] if the write or rename fails.
    pub fn write<S: AsRef<str>>(&self, ids: &[S]) -> Result<()> {
        let existing = self.read_contents()?;
        let contents = rewrite(existing.as_deref().unwrap_or(""), ids)
            .map_err(|count| self.malformed(count))?;
        self.replace(contents.as_bytes())?;
        debug!(path = %self.path.display(), members = ids.len(), "rewrote ACL line");
        Ok(())
    }

    fn read_contents(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(c) => Ok(Some(c)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn replace(&self, content: &[u8]) -> Result<()> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = match std::fs::metadata(&self.path) {
            // Keep the mode of the file being replaced.
            Ok(meta) => {
                let tmp = tempfile::NamedTempFile::new_in(parent)?;
                tmp.as_file().set_permissions(meta.permissions())?;
                tmp
            }
            Err(_) => new_config_file(parent)?,
        };

        tmp.write_all(content)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn malformed(&self, count: usize) -> AclError {
        AclError::MalformedConfig {
            path: self.path.clone(),
            count,
        }
    }
}

/// Temp file for a config that does not exist yet.
///
/// Shiny server reads the config as a different user, so a fresh file gets
/// the umask default like any other newly created file rather than the
/// owner-only mode of a temp file.
#[cfg(unix)]
fn new_config_file(dir: &Path) -> std::io::Result<tempfile::NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;

    tempfile::Builder::new()
        .permissions(std::fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn new_config_file(dir: &Path) -> std::io::Result<tempfile::NamedTempFile> {
    tempfile::NamedTempFile::new_in(dir)
}
