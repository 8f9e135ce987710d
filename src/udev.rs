//! udev daemon control and kernel log inspection

use tracing::info;
use udev_privilege::{CommandError, CommandOutput, CommandRunner, Credential};

use crate::reconcile::UDEVADM;

/// `udevadm control --reload-rules`
pub fn reload_rules(
    runner: &impl CommandRunner,
    credential: &Credential,
) -> Result<CommandOutput, CommandError> {
    info!("Reloading udev rules");
    runner.run(UDEVADM, &["control", "--reload-rules"], credential)
}

/// `udevadm trigger`
pub fn trigger(
    runner: &impl CommandRunner,
    credential: &Credential,
) -> Result<CommandOutput, CommandError> {
    info!("Triggering udev events");
    runner.run(UDEVADM, &["trigger"], credential)
}

/// Kernel log lines mentioning hidraw
pub fn dmesg_hidraw(
    runner: &impl CommandRunner,
    credential: &Credential,
) -> Result<Vec<String>, CommandError> {
    let output = runner.run("dmesg", &[], credential)?;
    Ok(filter_lines(&output.stdout, "hidraw"))
}

fn filter_lines(text: &str, needle: &str) -> Vec<String> {
    text.lines()
        .filter(|line| line.contains(needle))
        .map(str::to_string)
        .collect()
}
