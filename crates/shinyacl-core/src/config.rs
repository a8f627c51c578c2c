//! Manager configuration.
//!
//! Settings come from three layers, later ones winning: built-in defaults,
//! an optional YAML file, then environment variables. The CLI applies its
//! flags on top.
//!
//! ```yaml
//! root: /nfs/home/E/esarmien/shared_space
//! audit: syslog            # or `tracing`
//! audit_log: /var/log/shinyacl/audit.log
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::audit::AuditDestination;
use crate::error::ConfigError;

/// Environment variable overriding the root directory.
pub const ENV_ROOT: &str = "SHINYACL_ROOT";

/// Environment variable enabling the file audit log.
pub const ENV_AUDIT_LOG: &str = "SHINYACL_AUDIT_LOG";

/// Directory under the user's home that holds project space links.
pub const SHARED_SPACE_DIR: &str = "shared_space";

/// Configuration for building an [`crate::AclManager`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AclConfig {
    /// Directory whose entries are project spaces.
    pub root: PathBuf,
    /// Audit stream used when `audit_log` is unset.
    #[serde(default)]
    pub audit: AuditDestination,
    /// Append audit records to this file instead of `audit`.
    #[serde(default)]
    pub audit_log: Option<PathBuf>,
}

/// File form: every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    root: Option<PathBuf>,
    audit: Option<AuditDestination>,
    audit_log: Option<PathBuf>,
}

impl AclConfig {
    /// Load defaults, then `file` if given, then the environment.
    ///
    /// The home directory is only consulted when no layer sets `root`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed, or
    /// no root is configured and the home directory is unknown.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let from_file = match file {
            Some(path) => read_file(path)?,
            None => ConfigFile::default(),
        };
        Self::resolve(from_file, |name| std::env::var_os(name).map(PathBuf::from))
    }

    fn resolve<F>(file: ConfigFile, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<PathBuf>,
    {
        let root = match env(ENV_ROOT).or(file.root) {
            Some(root) => root,
            None => default_root()?,
        };
        let audit_log = env(ENV_AUDIT_LOG).or(file.audit_log);
        Ok(Self {
            root,
            audit: file.audit.unwrap_or_default(),
            audit_log,
        })
    }
}

/// `~/shared_space` for the invoking user.
///
/// # Errors
///
/// [`ConfigError::NoHomeDir`] if the home directory cannot be found.
pub fn default_root() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(SHARED_SPACE_DIR))
        .ok_or(ConfigError::NoHomeDir)
}

fn read_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if raw.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
