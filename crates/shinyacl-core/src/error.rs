//! # Error Types
//!
//! Defines the error types used throughout shinyacl. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Business-rule violations (duplicate grant, unknown member, malformed
//!   identifier) name the offending identifier and application.
//! - I/O failures are carried unchanged; nothing in the core retries.
//! - A missing config file is not an error: it reads as an empty ACL.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias for results produced by the core.
pub type Result<T> = std::result::Result<T, AclError>;

/// Top-level error type for ACL operations.
#[derive(Error, Debug)]
pub enum AclError {
    /// The root or a project space directory could not be listed.
    #[error("cannot discover applications under {}: {source}", .path.display())]
    Discovery {
        /// Directory that failed to list.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The path is not an application in the discovered tree.
    #[error(
        "{} is either not a Shiny application directory or is an application you do not have permission to access",
        .0.display()
    )]
    NotAManagedApplication(PathBuf),

    /// Identifier is neither an e-mail address nor an 8-digit ID.
    #[error("{0} is not a valid e-mail address or HUID")]
    InvalidIdentity(String),

    /// Identifier is already present in the application's ACL.
    #[error("{user} already has access to {}", .app.display())]
    UserAlreadyExists {
        /// Offending identifier.
        user: String,
        /// Application directory.
        app: PathBuf,
    },

    /// Identifier is not present in the application's ACL.
    #[error("no such user {user} in access control list for app {}", .app.display())]
    UserDoesNotExist {
        /// Offending identifier.
        user: String,
        /// Application directory.
        app: PathBuf,
    },

    /// More than one `required_user` line in a config file.
    #[error("{} contains {count} required_user lines; expected at most one", .path.display())]
    MalformedConfig {
        /// Config file path.
        path: PathBuf,
        /// Number of matching lines found.
        count: usize,
    },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AclError {
    /// Whether the error is a business-rule rejection rather than an
    /// environmental failure.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::NotAManagedApplication(_)
                | Self::InvalidIdentity(_)
                | Self::UserAlreadyExists { .. }
                | Self::UserDoesNotExist { .. }
        )
    }
}

/// Error while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No root was configured and the home directory is unknown.
    #[error("cannot determine the home directory; set SHINYACL_ROOT or pass --root")]
    NoHomeDir,

    /// Config file could not be read.
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid YAML for [`crate::AclConfig`].
    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: serde_yaml::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_exists_names_user_and_app() {
        let err = AclError::UserAlreadyExists {
            user: "a@a.com".to_string(),
            app: PathBuf::from("/srv/shinyserver/lab/app1"),
        };
        assert_eq!(
            err.to_string(),
            "a@a.com already has access to /srv/shinyserver/lab/app1"
        );
    }

    #[test]
    fn does_not_exist_names_user_and_app() {
        let err = AclError::UserDoesNotExist {
            user: "zzz".to_string(),
            app: PathBuf::from("/srv/app"),
        };
        assert!(err.to_string().contains("zzz"));
        assert!(err.to_string().contains("/srv/app"));
    }

    #[test]
    fn rejections_are_distinguished_from_io() {
        assert!(AclError::InvalidIdentity("x".into()).is_rejection());
        assert!(AclError::NotAManagedApplication(PathBuf::from("/x")).is_rejection());
        let io = AclError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert!(!io.is_rejection());
        let malformed = AclError::MalformedConfig {
            path: PathBuf::from("/x/.shiny_app.conf"),
            count: 2,
        };
        assert!(!malformed.is_rejection());
    }

    #[test]
    fn discovery_error_exposes_source() {
        use std::error::Error as _;
        let err = AclError::Discovery {
            path: PathBuf::from("/missing"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("cannot discover applications under /missing"));
    }
}
