//! # Console Output
//!
//! Status lines carry a visible marker so a terminal user can scan a run
//! for failures.

use std::fmt::Display;
use std::io::{self, Write};

use shinyacl_core::AclError;

/// Marker printed before a successful step.
pub const OK_MARK: &str = "\u{2705}";

/// Marker printed before a failed step.
pub const FAIL_MARK: &str = "\u{274C}";

/// Print a success line.
pub fn success<W: Write>(out: &mut W, message: impl Display) -> io::Result<()> {
    writeln!(out, "{OK_MARK}   {message}")
}

/// Print a failure line.
pub fn failure<W: Write>(out: &mut W, message: impl Display) -> io::Result<()> {
    writeln!(out, "{FAIL_MARK}   {message}")
}

/// Print an ACL error, with troubleshooting steps where they help.
pub fn report_error<W: Write>(out: &mut W, err: &AclError) -> io::Result<()> {
    failure(out, err)?;
    if let AclError::NotAManagedApplication(_) = err {
        writeln!(out, "Troubleshooting")?;
        writeln!(out, "---------------")?;
        writeln!(out, "   Is there a server.R or index.Rmd file present within this directory?")?;
        writeln!(out, "   Run the following command to list applications available to you:")?;
        writeln!(out, "      shiny-acl list-applications")?;
        writeln!(out, "   Do you have the proper groups assigned to your username?")?;
    }
    Ok(())
}

/// A heading underlined to its own width.
pub fn heading<W: Write>(out: &mut W, title: &str) -> io::Result<()> {
    writeln!(out, "{title}")?;
    writeln!(out, "{}", "-".repeat(title.chars().count()))
}
