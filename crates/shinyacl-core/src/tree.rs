//! # Application Tree Discovery
//!
//! Discovers which directories are managed Shiny applications.
//!
//! The layout consumed is `root/<project space>/<app>/`. Entries under the
//! root are usually symlinks into the Shiny server's web tree; an entry is a
//! project space when its resolved path contains the `shinyserver`
//! component. An immediate subdirectory of a project space is an
//! application when it contains `server.R` or `index.Rmd`.
//!
//! Discovery is a one-shot snapshot. Applications created afterwards are
//! invisible until the tree is rebuilt.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{AclError, Result};

/// Path component that marks a directory as part of the Shiny server tree.
pub const PROJECT_SPACE_MARKER: &str = "shinyserver";

/// Files whose presence marks a directory as a Shiny application.
pub const APP_MARKER_FILES: [&str; 2] = ["server.R", "index.Rmd"];

/// What a directory is, as far as the hosting platform is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// A directory under the Shiny server tree that groups applications.
    ProjectSpace,
    /// A directory holding an application entry point.
    Application,
    /// Anything else.
    Neither,
}

/// Classify a path by probing the filesystem.
///
/// Application markers take precedence: a directory that both sits under
/// the Shiny tree and carries a marker file is an application.
pub fn classify(path: &Path) -> Classification {
    if !path.is_dir() {
        return Classification::Neither;
    }
    if has_app_marker(path) {
        return Classification::Application;
    }
    if has_project_space_marker(path) {
        return Classification::ProjectSpace;
    }
    Classification::Neither
}

fn has_app_marker(dir: &Path) -> bool {
    APP_MARKER_FILES.iter().any(|f| dir.join(f).is_file())
}

fn has_project_space_marker(path: &Path) -> bool {
    path.components()
        .any(|c| c.as_os_str() == OsStr::new(PROJECT_SPACE_MARKER))
}

/// Project spaces mapped to the applications they contain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppTree {
    spaces: BTreeMap<PathBuf, Vec<PathBuf>>,
}

impl AppTree {
    /// Discover the tree under `root`.
    ///
    /// # Errors
    ///
    /// [`AclError::Discovery`] if `root` or a project space cannot be listed.
    pub fn discover(root: &Path) -> Result<Self> {
        let mut spaces = BTreeMap::new();
        for space in project_spaces(root)? {
            if spaces.contains_key(&space) {
                continue;
            }
            let apps = applications(&space)?;
            debug!(
                project_space = %space.display(),
                apps = apps.len(),
                "discovered project space"
            );
            spaces.insert(space, apps);
        }
        Ok(Self { spaces })
    }

    /// True when no project space was found.
    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }

    /// Number of project spaces.
    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    /// Project space paths, sorted.
    pub fn project_spaces(&self) -> impl Iterator<Item = &Path> {
        self.spaces.keys().map(PathBuf::as_path)
    }

    /// Applications of one project space, in listing order.
    pub fn applications(&self, project_space: &Path) -> Option<&[PathBuf]> {
        self.spaces.get(project_space).map(Vec::as_slice)
    }

    /// Iterate `(project space, applications)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[PathBuf])> {
        self.spaces
            .iter()
            .map(|(space, apps)| (space.as_path(), apps.as_slice()))
    }

    /// Every application across all project spaces.
    pub fn all_applications(&self) -> impl Iterator<Item = &Path> {
        self.spaces.values().flatten().map(PathBuf::as_path)
    }

    /// Whether `app` is a discovered application.
    pub fn contains(&self, app: &Path) -> bool {
        self.all_applications().any(|a| a == app)
    }
}

/// Resolved project space directories directly under `root`.
fn project_spaces(root: &Path) -> Result<Vec<PathBuf>> {
    let mut spaces = Vec::new();
    for name in list_dir(root)? {
        let entry = root.join(&name);
        let resolved = match std::fs::canonicalize(&entry) {
            Ok(p) => p,
            Err(e) => {
                debug!(entry = %entry.display(), error = %e, "skipping unresolvable entry");
                continue;
            }
        };
        if has_project_space_marker(&resolved) && resolved.is_dir() {
            spaces.push(resolved);
        } else {
            debug!(entry = %entry.display(), resolved = %resolved.display(), "not a project space");
        }
    }
    Ok(spaces)
}

/// Application directories directly under a project space.
fn applications(space: &Path) -> Result<Vec<PathBuf>> {
    Ok(list_dir(space)?
        .into_iter()
        .map(|name| space.join(name))
        .filter(|p| classify(p) == Classification::Application)
        .collect())
}

fn list_dir(dir: &Path) -> Result<Vec<std::ffi::OsString>> {
    let discovery = |source: std::io::Error| AclError::Discovery {
        path: dir.to_path_buf(),
        source,
    };
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(discovery)? {
        names.push(entry.map_err(discovery)?.file_name());
    }
    Ok(names)
}
