//! # shinyacl-core: Shiny Server Access Control
//!
//! Manages who may access applications hosted on a multi-tenant Shiny
//! server. Each application is a directory; its access-control list is the
//! single `required_user ...;` line of its `.shiny_app.conf`, and changes
//! take effect once `restart.txt` in the directory is touched.
//!
//! ## Components
//!
//! - [`identity`]: syntactic validation of e-mail and 8-digit identifiers.
//! - [`acl_file`]: reads and rewrites the `required_user` line.
//! - [`tree`]: discovers project spaces and applications on disk.
//! - [`audit`]: audit records and the sinks that receive them.
//! - [`reload`]: the `restart.txt` reload trigger.
//! - [`manager`]: [`AclManager`], composing the above.
//! - [`config`]: root and audit log settings.
//!
//! ## Crate Policy
//!
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Single-threaded and blocking; no internal concurrency.
//!
//! ```no_run
//! use std::path::Path;
//! use shinyacl_core::AclManager;
//!
//! # fn main() -> Result<(), shinyacl_core::AclError> {
//! let acl = AclManager::new("/nfs/home/E/esarmien/shared_space")?;
//! let app = Path::new("/nfs/www/shinyserver/vpal/hello");
//! acl.add_users(app, &["esarmien@g.harvard.edu"])?;
//! acl.reload(app)?;
//! # Ok(())
//! # }
//! ```

pub mod acl_file;
pub mod audit;
pub mod config;
pub mod error;
pub mod identity;
pub mod manager;
pub mod reload;
pub mod tree;

// Re-export primary types for ergonomic imports.
pub use acl_file::{AclFile, ACL_KEYWORD, CONFIG_FILE_NAME};
pub use audit::{
    AuditAction, AuditDestination, AuditRecord, AuditSink, FileAuditSink, MemoryAuditSink,
    TracingAuditSink, AUDIT_TARGET,
};
#[cfg(unix)]
pub use audit::SyslogAuditSink;
pub use config::AclConfig;
pub use error::{AclError, ConfigError, Result};
pub use manager::AclManager;
pub use reload::RESTART_FILE_NAME;
pub use tree::{AppTree, Classification};
