//! # List Subcommands
//!
//! `list-applications` and `list-users`, as text or JSON.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use shinyacl_core::AclManager;

use crate::output;

/// Arguments for the `list-applications` subcommand.
#[derive(Args, Debug)]
pub struct ListApplicationsArgs {
    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `list-users` subcommand.
#[derive(Args, Debug)]
pub struct ListUsersArgs {
    /// Application directory.
    #[arg(value_name = "APP")]
    pub app: PathBuf,

    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ProjectSpaceListing<'a> {
    project_space: &'a Path,
    applications: &'a [PathBuf],
}

#[derive(Serialize)]
struct UserListing<'a> {
    application: &'a Path,
    users: &'a [String],
}

/// Execute `list-applications`.
pub fn run_list_applications<W: Write>(
    args: &ListApplicationsArgs,
    acl: &AclManager,
    out: &mut W,
) -> Result<u8> {
    let tree = acl.list_applications();

    if args.json {
        let listing: Vec<ProjectSpaceListing<'_>> = tree
            .iter()
            .map(|(project_space, applications)| ProjectSpaceListing {
                project_space,
                applications,
            })
            .collect();
        serde_json::to_writer_pretty(&mut *out, &listing)
            .context("failed to serialize application listing")?;
        writeln!(out)?;
        return Ok(0);
    }

    if tree.is_empty() {
        output::failure(
            out,
            format!(
                "You currently have no Shiny projects defined in {}.\n    \
                 If you were recently added to a project space, please wait up to \
                 fifteen minutes for your project space to appear.",
                acl.root().display()
            ),
        )?;
        return Ok(0);
    }

    for (space, apps) in tree.iter() {
        output::heading(out, &format!("Project space: {}", space.display()))?;
        for app in apps {
            writeln!(out, "{}", app.display())?;
        }
        writeln!(out)?;
    }
    Ok(0)
}

/// Execute `list-users`.
pub fn run_list_users<W: Write>(args: &ListUsersArgs, acl: &AclManager, out: &mut W) -> Result<u8> {
    let app = crate::resolve_app_path(&args.app);
    let users = match acl.get_users(&app) {
        Ok(users) => users,
        Err(e) => {
            output::report_error(out, &e)?;
            return Ok(1);
        }
    };

    if args.json {
        let listing = UserListing {
            application: &app,
            users: &users,
        };
        serde_json::to_writer_pretty(&mut *out, &listing)
            .context("failed to serialize user listing")?;
        writeln!(out)?;
        return Ok(0);
    }

    output::heading(out, &app.display().to_string())?;
    if users.is_empty() {
        writeln!(out, "No users currently configured.")?;
    }
    for user in &users {
        writeln!(out, "{user}")?;
    }
    Ok(0)
}
