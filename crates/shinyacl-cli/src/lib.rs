//! # shinyacl-cli: Shiny Server ACL Command-Line Interface
//!
//! Provides the `shiny-acl` command. Each subcommand maps to exactly one
//! [`shinyacl_core::AclManager`] call, followed by a reload of the
//! application after a successful change.
//!
//! ## Subcommands
//!
//! - `shiny-acl list-applications`: project spaces and their applications.
//! - `shiny-acl list-users <APP>`: identifiers with access to an app.
//! - `shiny-acl add-user <APP> <USER>...`: grant access.
//! - `shiny-acl del-user <APP> <USER>...`: revoke access.
//! - `shiny-acl del-all <APP>`: revoke everyone.
//! - `shiny-acl reload <APP>`: touch `restart.txt` without changing the ACL.
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from business logic.
//! - Handlers delegate to `shinyacl-core`; no ACL rules live here.
//! - Handlers return the process exit code: 0 on success, 1 when the
//!   operation was rejected or failed.

pub mod grant;
pub mod list;
pub mod output;
pub mod reload;

use std::path::{Path, PathBuf};

/// Resolve an application path given on the command line.
///
/// Discovery records an application as its canonical project space joined
/// with the directory name, so only the parent is canonicalized here. A path
/// reached through the `shared_space` symlinks then names the same
/// application as the discovered one, and an application directory that is
/// itself a symlink keeps its listed name. Paths whose parent does not
/// resolve are returned unchanged and will be rejected by the manager.
pub fn resolve_app_path(path: &Path) -> PathBuf {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    };
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    match std::fs::canonicalize(parent) {
        Ok(parent) => parent.join(name),
        Err(_) => path.to_path_buf(),
    }
}
