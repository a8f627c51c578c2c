//! # Audit Trail
//!
//! Every mutation of an ACL emits one [`AuditRecord`] per affected
//! identifier. Records are write-only: nothing in shinyacl reads them back.
//!
//! The sink is injected into the manager rather than being a process-wide
//! logger. It stays open for the manager's lifetime and each record is
//! flushed as it is written. On unix the default destination is the system
//! log at `LOG_CRIT`, so records outlive the invoking terminal.
//!
//! ## Message format
//!
//! ```text
//! <actor> added user <id> to <app>
//! <actor> removed user <id> from <app>
//! <actor> removed all users from <app>
//! ```

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

use crate::error::Result;

/// `tracing` target under which audit events are emitted.
pub const AUDIT_TARGET: &str = "shinyacl::audit";

/// Where audit records go when no audit log file is configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditDestination {
    /// The system log (falls back to `tracing` off unix).
    #[default]
    Syslog,
    /// `tracing` events under [`AUDIT_TARGET`].
    Tracing,
}

impl std::str::FromStr for AuditDestination {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "syslog" => Ok(Self::Syslog),
            "tracing" => Ok(Self::Tracing),
            other => Err(format!(
                "unknown audit destination {other:?}; expected syslog or tracing"
            )),
        }
    }
}

impl AuditDestination {
    /// Build the sink for this destination.
    pub fn sink(self) -> Box<dyn AuditSink> {
        match self {
            #[cfg(unix)]
            Self::Syslog => Box::new(SyslogAuditSink),
            #[cfg(not(unix))]
            Self::Syslog => Box::new(TracingAuditSink),
            Self::Tracing => Box::new(TracingAuditSink),
        }
    }
}

/// Kind of ACL mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditAction {
    /// One identifier granted access.
    Added,
    /// One identifier's access revoked.
    Removed,
    /// Entire ACL cleared.
    RemovedAll,
}

impl AuditAction {
    /// Stable lowercase name, used as a structured log field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "add",
            Self::Removed => "remove",
            Self::RemovedAll => "remove_all",
        }
    }
}

/// One audited mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    /// When the mutation was persisted.
    pub timestamp: DateTime<Utc>,
    /// OS user that executed the mutation.
    pub actor: String,
    /// What was done.
    pub action: AuditAction,
    /// Identifier affected; `None` for [`AuditAction::RemovedAll`].
    pub subject: Option<String>,
    /// Application directory.
    pub app: PathBuf,
}

impl AuditRecord {
    /// Record a grant.
    pub fn added(actor: &str, subject: &str, app: &Path) -> Self {
        Self::new(actor, AuditAction::Added, Some(subject), app)
    }

    /// Record a revocation.
    pub fn removed(actor: &str, subject: &str, app: &Path) -> Self {
        Self::new(actor, AuditAction::Removed, Some(subject), app)
    }

    /// Record clearing the whole ACL.
    pub fn removed_all(actor: &str, app: &Path) -> Self {
        Self::new(actor, AuditAction::RemovedAll, None, app)
    }

    fn new(actor: &str, action: AuditAction, subject: Option<&str>, app: &Path) -> Self {
        Self {
            timestamp: Utc::now(),
            actor: actor.to_string(),
            action,
            subject: subject.map(str::to_string),
            app: app.to_path_buf(),
        }
    }
}

impl std::fmt::Display for AuditRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let app = self.app.display();
        let subject = self.subject.as_deref().unwrap_or("");
        match self.action {
            AuditAction::Added => write!(f, "{} added user {subject} to {app}", self.actor),
            AuditAction::Removed => write!(f, "{} removed user {subject} from {app}", self.actor),
            AuditAction::RemovedAll => write!(f, "{} removed all users from {app}", self.actor),
        }
    }
}

/// Destination for audit records.
pub trait AuditSink: Send {
    /// Persist one record.
    ///
    /// # Errors
    ///
    /// Propagates any failure to write the record.
    fn record(&self, record: &AuditRecord) -> Result<()>;
}

/// Emits records as `tracing` events under [`AUDIT_TARGET`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: &AuditRecord) -> Result<()> {
        tracing::info!(
            target: AUDIT_TARGET,
            actor = %record.actor,
            action = record.action.as_str(),
            subject = record.subject.as_deref().unwrap_or(""),
            app = %record.app.display(),
            "{record}"
        );
        Ok(())
    }
}

/// Sends each record to the system log at `LOG_CRIT`, facility `LOG_USER`.
///
/// The message is the bare record; syslog adds the timestamp, host and
/// program name.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, Default)]
pub struct SyslogAuditSink;

#[cfg(unix)]
impl AuditSink for SyslogAuditSink {
    fn record(&self, record: &AuditRecord) -> Result<()> {
        use nix::syslog::{syslog, Facility, Priority, Severity};

        let priority = Priority::new(Severity::LOG_CRIT, Facility::LOG_USER);
        syslog(priority, record.to_string().as_str()).map_err(std::io::Error::from)?;
        Ok(())
    }
}

/// Appends one timestamped line per record to a file.
#[derive(Debug)]
pub struct FileAuditSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileAuditSink {
    /// Open (creating if needed) `path` for appending.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Path of the audit log.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, record: &AuditRecord) -> Result<()> {
        let line = format!(
            "{} {record}\n",
            record.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

/// Collects records in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditSink {
    records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl MemoryAuditSink {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records collected so far.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Rendered messages of the records collected so far.
    pub fn messages(&self) -> Vec<String> {
        self.records().iter().map(ToString::to_string).collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: &AuditRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }
}

/// Name of the OS user running this process.
///
/// Falls back to the numeric uid when the uid has no passwd entry.
///
/// # Errors
///
/// Returns an I/O error if the user database lookup itself fails.
#[cfg(unix)]
pub fn executing_identity() -> Result<String> {
    use nix::unistd::{getuid, User};

    let uid = getuid();
    match User::from_uid(uid) {
        Ok(Some(user)) => Ok(user.name),
        Ok(None) => Ok(uid.to_string()),
        Err(errno) => Err(std::io::Error::from(errno).into()),
    }
}

/// Name of the user running this process, from the environment.
#[cfg(not(unix))]
pub fn executing_identity() -> Result<String> {
    Ok(std::env::var("USERNAME")
        .or_else(|_| std::env::var("USER"))
        .unwrap_or_else(|_| "unknown".to_string()))
}
