//! # Grant and Revoke Subcommands
//!
//! `add-user`, `del-user` and `del-all`. A successful change is followed by
//! exactly one reload of the application; a rejected change is reported and
//! the application is left alone.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use shinyacl_core::{AclError, AclManager};

use crate::output;

/// Arguments for the `add-user` subcommand.
#[derive(Args, Debug)]
pub struct AddUserArgs {
    /// Application directory.
    #[arg(value_name = "APP")]
    pub app: PathBuf,

    /// Google e-mail addresses or HUIDs to grant access.
    #[arg(value_name = "USER", required = true, num_args = 1..)]
    pub users: Vec<String>,
}

/// Arguments for the `del-user` subcommand.
#[derive(Args, Debug)]
pub struct DelUserArgs {
    /// Application directory.
    #[arg(value_name = "APP")]
    pub app: PathBuf,

    /// Google e-mail addresses or HUIDs to revoke.
    #[arg(value_name = "USER", required = true, num_args = 1..)]
    pub users: Vec<String>,
}

/// Arguments for the `del-all` subcommand.
#[derive(Args, Debug)]
pub struct DelAllArgs {
    /// Application directory.
    #[arg(value_name = "APP")]
    pub app: PathBuf,
}

/// Execute `add-user`.
pub fn run_add_user<W: Write>(args: &AddUserArgs, acl: &AclManager, out: &mut W) -> Result<u8> {
    let app = crate::resolve_app_path(&args.app);
    let outcome = acl.add_users(&app, &args.users);
    finish(acl, &app, outcome, out, || {
        format!(
            "Successfully added user(s) {} to {}",
            args.users.join(" "),
            app.display()
        )
    })
}

/// Execute `del-user`.
pub fn run_del_user<W: Write>(args: &DelUserArgs, acl: &AclManager, out: &mut W) -> Result<u8> {
    let app = crate::resolve_app_path(&args.app);
    let outcome = acl.del_users(&app, &args.users);
    finish(acl, &app, outcome, out, || {
        format!(
            "Successfully removed user(s) {} from {}",
            args.users.join(" "),
            app.display()
        )
    })
}

/// Execute `del-all`.
pub fn run_del_all<W: Write>(args: &DelAllArgs, acl: &AclManager, out: &mut W) -> Result<u8> {
    let app = crate::resolve_app_path(&args.app);
    let outcome = acl.del_all(&app);
    finish(acl, &app, outcome, out, || {
        format!("Successfully removed all users from {}", app.display())
    })
}

/// Report a mutation outcome and reload the application on success.
fn finish<W, F>(
    acl: &AclManager,
    app: &Path,
    outcome: std::result::Result<(), AclError>,
    out: &mut W,
    success_message: F,
) -> Result<u8>
where
    W: Write,
    F: FnOnce() -> String,
{
    if let Err(e) = outcome {
        if !e.is_rejection() {
            tracing::error!(app = %app.display(), error = %e, "ACL update failed");
        }
        output::report_error(out, &e)?;
        return Ok(1);
    }
    output::success(out, success_message())?;
    crate::reload::reload_and_report(acl, app, out)
}
