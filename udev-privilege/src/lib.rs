//! Privileged command runner
//!
//! Runs external commands through `sudo` (or another elevation helper),
//! handing over the password on the child's stdin and capturing its
//! output. Used by `octavi_udev` for every operation that needs root:
//! udevadm queries, chmod on hidraw nodes, and writing udev rule files.

pub mod credential;
pub mod error;
pub mod runner;

pub use credential::Credential;
pub use error::CommandError;
pub use runner::{
    is_rejection, run_elevated_command, CommandOutput, CommandRunner, Elevation, SudoRunner,
    DEFAULT_TIMEOUT,
};
