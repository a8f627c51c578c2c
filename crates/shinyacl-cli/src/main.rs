//! # shiny-acl CLI entry point
//!
//! Parses command-line arguments, builds the ACL manager from layered
//! configuration and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use shinyacl_cli::grant::{
    run_add_user, run_del_all, run_del_user, AddUserArgs, DelAllArgs, DelUserArgs,
};
use shinyacl_cli::list::{
    run_list_applications, run_list_users, ListApplicationsArgs, ListUsersArgs,
};
use shinyacl_cli::reload::{run_reload, ReloadArgs};
use shinyacl_core::{AclConfig, AclManager, AuditDestination, AUDIT_TARGET};

/// Manage Shiny server access control lists.
///
/// Grants and revokes access to Shiny applications in your project spaces
/// by editing the `required_user` line of each application's
/// `.shiny_app.conf`, then reloads the application.
#[derive(Parser, Debug)]
#[command(name = "shiny-acl", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit diagnostics and audit events as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding project space links (default: ~/shared_space).
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Append audit records to this file.
    #[arg(long, global = true)]
    audit_log: Option<PathBuf>,

    /// Audit stream when no audit log file is set: `syslog` (default) or `tracing`.
    #[arg(long, global = true, value_name = "KIND")]
    audit: Option<AuditDestination>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List Shiny applications available to you.
    ListApplications(ListApplicationsArgs),

    /// List users who have access to an application.
    ListUsers(ListUsersArgs),

    /// Grant users (Google e-mail addresses or HUIDs) access to an application.
    AddUser(AddUserArgs),

    /// Revoke users' access to an application.
    DelUser(DelUserArgs),

    /// Revoke all users' access to an application.
    DelAll(DelAllArgs),

    /// Restart an application without changing its access list.
    Reload(ReloadArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

/// Initialize tracing on stderr; audit events are always enabled.
fn init_tracing(verbose: u8, json: bool) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::new(format!("{level},{AUDIT_TARGET}=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Resolve configuration: defaults, then file and environment, then flags.
fn resolve_config(cli: &Cli) -> anyhow::Result<AclConfig> {
    let mut config =
        AclConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    if let Some(audit_log) = &cli.audit_log {
        config.audit_log = Some(audit_log.clone());
    }
    if let Some(audit) = cli.audit {
        config.audit = audit;
    }
    Ok(config)
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let config = resolve_config(&cli)?;
    tracing::debug!(root = %config.root.display(), "resolved configuration");

    let acl = AclManager::from_config(&config).with_context(|| {
        format!(
            "failed to load Shiny applications under {}",
            config.root.display()
        )
    })?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match &cli.command {
        Commands::ListApplications(args) => run_list_applications(args, &acl, &mut out),
        Commands::ListUsers(args) => run_list_users(args, &acl, &mut out),
        Commands::AddUser(args) => run_add_user(args, &acl, &mut out),
        Commands::DelUser(args) => run_del_user(args, &acl, &mut out),
        Commands::DelAll(args) => run_del_all(args, &acl, &mut out),
        Commands::Reload(args) => run_reload(args, &acl, &mut out),
    }
}
