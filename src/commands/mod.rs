//! Command handlers for the CLI application.
//!
//! - `rules`: rule file commands (list, show, create-rule)
//! - `system`: udev control and diagnostics (reload, trigger, hidraw, dmesg)
//! - `devices`: device discovery and permission reconciliation (find)

pub mod devices;
pub mod rules;
pub mod system;

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use octavi_udev::Credential;

/// Result type for command handlers
pub type CommandResult = anyhow::Result<()>;

/// Obtain the sudo password, either from stdin or an interactive prompt.
/// Returns `None` if the user entered nothing.
pub fn read_credential(from_stdin: bool) -> anyhow::Result<Option<Credential>> {
    let secret = if from_stdin {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        let len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(len);
        line
    } else {
        dialoguer::Password::new()
            .with_prompt("Sudo password")
            .allow_empty_password(true)
            .interact()?
    };

    let credential = Credential::new(secret);
    if credential.is_empty() {
        return Ok(None);
    }
    Ok(Some(credential))
}

/// Setup Ctrl+C handler and return the cancellation flag
pub fn setup_interrupt_handler() -> Arc<AtomicBool> {
    let cancelled = Arc::new(AtomicBool::new(false));
    let cancelled_clone = cancelled.clone();

    ctrlc::set_handler(move || {
        cancelled_clone.store(true, Ordering::SeqCst);
    })
    .ok();

    cancelled
}
