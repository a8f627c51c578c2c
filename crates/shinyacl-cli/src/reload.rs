//! # Reload Subcommand
//!
//! Touches an application's `restart.txt` so Shiny server restarts it.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use shinyacl_core::AclManager;

use crate::output;

/// Arguments for the `reload` subcommand.
#[derive(Args, Debug)]
pub struct ReloadArgs {
    /// Application directory.
    #[arg(value_name = "APP")]
    pub app: PathBuf,
}

/// Execute `reload`.
pub fn run_reload<W: Write>(args: &ReloadArgs, acl: &AclManager, out: &mut W) -> Result<u8> {
    let app = crate::resolve_app_path(&args.app);
    reload_and_report(acl, &app, out)
}

/// Reload `app` and print the outcome.
pub fn reload_and_report<W: Write>(acl: &AclManager, app: &Path, out: &mut W) -> Result<u8> {
    match acl.reload(app) {
        Ok(()) => {
            output::success(out, "Reloaded shiny-server")?;
            Ok(0)
        }
        Err(e) => {
            output::report_error(out, &e)?;
            Ok(1)
        }
    }
}
