//! Error types for discovery, reconciliation and rule handling

use std::path::PathBuf;

use thiserror::Error;
use udev_privilege::CommandError;

/// Errors that abort a whole reconciliation run.
///
/// Per-device query and chmod failures never show up here; they are
/// skipped or recorded in the report.
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Cannot list device directory {}: {source}", .dir.display())]
    Enumeration {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sudo rejected the password")]
    CredentialRejected(#[source] CommandError),
}

/// Errors from udev rule parsing and file handling
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Malformed rule: {0}")]
    Malformed(String),

    #[error("Rule is missing {0}")]
    MissingKey(&'static str),

    #[error("Invalid mode '{0}': expected octal like 0666")]
    InvalidMode(String),

    #[error("Invalid rule file name '{0}': must be a plain *.rules file name")]
    InvalidFileName(String),

    #[error("Cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Id(#[from] crate::device_id::DeviceIdError),

    #[error(transparent)]
    Command(#[from] CommandError),
}
