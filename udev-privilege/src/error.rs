//! Command runner error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while running an elevated command
///
/// None of the variants ever carry the credential; `stderr` is whatever the
/// child wrote, which sudo never echoes the password into.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {}: {}", fmt_status(.status), .stderr.trim())]
    Failed {
        program: String,
        /// Exit code, `None` when the child was killed by a signal
        status: Option<i32>,
        stderr: String,
    },

    #[error("Credential rejected while running {program}")]
    CredentialRejected { program: String, stderr: String },

    #[error("{program} timed out after {}ms", .timeout.as_millis())]
    Timeout { program: String, timeout: Duration },

    #[error("I/O error while running {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl CommandError {
    /// Captured standard error of the failing command, if any
    pub fn stderr(&self) -> Option<&str> {
        match self {
            CommandError::Failed { stderr, .. } | CommandError::CredentialRejected { stderr, .. } => {
                Some(stderr)
            }
            _ => None,
        }
    }

    /// Exit status of the failing command, if it exited on its own
    pub fn exit_status(&self) -> Option<i32> {
        match self {
            CommandError::Failed { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_credential_rejected(&self) -> bool {
        matches!(self, CommandError::CredentialRejected { .. })
    }
}

fn fmt_status(status: &Option<i32>) -> String {
    match *status {
        Some(code) => format!("status {code}"),
        None => "signal".to_string(),
    }
}
