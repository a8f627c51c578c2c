//! # ACL Manager
//!
//! Composes discovery, the config file store, identity validation and the
//! audit sink into the operations exposed to callers.
//!
//! ## Semantics
//!
//! - Every operation first checks that the application is in the tree
//!   discovered at construction. Unknown paths are rejected before any
//!   filesystem access, whether or not they exist on disk.
//! - Batch operations are sequential. Each identifier gets its own
//!   read-modify-write cycle and its own audit record. When an identifier
//!   is rejected the batch stops there; identifiers already processed stay
//!   persisted.
//! - The tree is a snapshot. Call [`AclManager::refresh`] to pick up
//!   applications created after construction.
//! - There is no locking around read-modify-write. Two processes editing
//!   the same application concurrently can lose an update.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::acl_file::AclFile;
use crate::audit::{
    executing_identity, AuditDestination, AuditRecord, AuditSink, FileAuditSink,
};
use crate::config::AclConfig;
use crate::error::{AclError, Result};
use crate::identity;
use crate::reload;
use crate::tree::AppTree;

/// Entry point for ACL queries and mutations.
pub struct AclManager {
    root: PathBuf,
    tree: AppTree,
    actor: String,
    sink: Box<dyn AuditSink>,
}

impl std::fmt::Debug for AclManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AclManager")
            .field("root", &self.root)
            .field("tree", &self.tree)
            .field("actor", &self.actor)
            .finish_non_exhaustive()
    }
}

impl AclManager {
    /// Discover applications under `root`, auditing to the system log.
    ///
    /// # Errors
    ///
    /// [`AclError::Discovery`] if the root or a project space is unreadable,
    /// or an I/O error if the executing user cannot be resolved.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let tree = AppTree::discover(&root)?;
        let actor = executing_identity()?;
        debug!(
            root = %root.display(),
            project_spaces = tree.len(),
            actor = %actor,
            "built application tree"
        );
        Ok(Self {
            root,
            tree,
            actor,
            sink: AuditDestination::default().sink(),
        })
    }

    /// Build from configuration. An audit log file, when set, takes
    /// precedence over the configured destination.
    ///
    /// # Errors
    ///
    /// As [`AclManager::new`], plus an I/O error if the audit log cannot be
    /// opened.
    pub fn from_config(config: &AclConfig) -> Result<Self> {
        let mut manager = Self::new(&config.root)?;
        manager.sink = match &config.audit_log {
            Some(path) => Box::new(FileAuditSink::open(path)?),
            None => config.audit.sink(),
        };
        Ok(manager)
    }

    /// Replace the audit sink.
    pub fn with_sink(mut self, sink: impl AuditSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Override the identity recorded as the actor of mutations.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    /// Directory the tree was discovered from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Identity recorded in audit records.
    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// The discovered project spaces and their applications.
    pub fn list_applications(&self) -> &AppTree {
        &self.tree
    }

    /// Rediscover the tree from the root.
    ///
    /// # Errors
    ///
    /// [`AclError::Discovery`]; the previous snapshot is kept on failure.
    pub fn refresh(&mut self) -> Result<()> {
        self.tree = AppTree::discover(&self.root)?;
        debug!(project_spaces = self.tree.len(), "refreshed application tree");
        Ok(())
    }

    /// Identifiers currently granted access to `app`, in file order.
    ///
    /// # Errors
    ///
    /// [`AclError::NotAManagedApplication`] for unknown paths, otherwise any
    /// error from reading the config file.
    pub fn get_users(&self, app: &Path) -> Result<Vec<String>> {
        let file = self.acl_file(app)?;
        file.read()
    }

    /// Grant each identifier access to `app`, in order.
    ///
    /// # Errors
    ///
    /// Stops at the first [`AclError::InvalidIdentity`] or
    /// [`AclError::UserAlreadyExists`]; earlier identifiers stay granted.
    pub fn add_users<S: AsRef<str>>(&self, app: &Path, users: &[S]) -> Result<()> {
        let file = self.acl_file(app)?;
        for user in users {
            let user = user.as_ref();
            if !identity::is_valid(user) {
                return Err(AclError::InvalidIdentity(user.to_string()));
            }
            let mut current = file.read()?;
            if current.iter().any(|u| u == user) {
                return Err(AclError::UserAlreadyExists {
                    user: user.to_string(),
                    app: app.to_path_buf(),
                });
            }
            current.push(user.to_string());
            file.write(&current)?;
            self.audit(AuditRecord::added(&self.actor, user, app))?;
        }
        Ok(())
    }

    /// Revoke each identifier's access to `app`, in order.
    ///
    /// # Errors
    ///
    /// Stops at the first [`AclError::UserDoesNotExist`]; earlier
    /// identifiers stay revoked.
    pub fn del_users<S: AsRef<str>>(&self, app: &Path, users: &[S]) -> Result<()> {
        let file = self.acl_file(app)?;
        for user in users {
            let user = user.as_ref();
            let current = file.read()?;
            if !current.iter().any(|u| u == user) {
                return Err(AclError::UserDoesNotExist {
                    user: user.to_string(),
                    app: app.to_path_buf(),
                });
            }
            let remaining: Vec<&String> = current.iter().filter(|u| *u != user).collect();
            file.write(&remaining)?;
            self.audit(AuditRecord::removed(&self.actor, user, app))?;
        }
        Ok(())
    }

    /// Clear the ACL of `app`.
    ///
    /// # Errors
    ///
    /// [`AclError::NotAManagedApplication`] for unknown paths, otherwise any
    /// error from rewriting the config file.
    pub fn del_all(&self, app: &Path) -> Result<()> {
        let file = self.acl_file(app)?;
        file.write::<&str>(&[])?;
        self.audit(AuditRecord::removed_all(&self.actor, app))
    }

    /// Ask Shiny server to reload `app` by touching its `restart.txt`.
    ///
    /// # Errors
    ///
    /// [`AclError::NotAManagedApplication`] for unknown paths, otherwise the
    /// I/O error from the touch.
    pub fn reload(&self, app: &Path) -> Result<()> {
        self.ensure_managed(app)?;
        reload::touch(app)?;
        info!(app = %app.display(), "requested application reload");
        Ok(())
    }

    fn ensure_managed(&self, app: &Path) -> Result<()> {
        if self.tree.contains(app) {
            Ok(())
        } else {
            Err(AclError::NotAManagedApplication(app.to_path_buf()))
        }
    }

    fn acl_file(&self, app: &Path) -> Result<AclFile> {
        self.ensure_managed(app)?;
        Ok(AclFile::for_app(app))
    }

    fn audit(&self, record: AuditRecord) -> Result<()> {
        debug!(app = %record.app.display(), action = record.action.as_str(), "ACL updated");
        self.sink.record(&record)
    }
}
