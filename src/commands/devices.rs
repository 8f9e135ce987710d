//! Device discovery command handler.

use super::{read_credential, setup_interrupt_handler, CommandResult};
use octavi_udev::{Config, DeviceId, Reconciler};

/// Find hidraw nodes of `device` and chmod them to 0666
pub fn find(
    config: &Config,
    device: Option<DeviceId>,
    json: bool,
    password_stdin: bool,
) -> CommandResult {
    let target = device.unwrap_or(config.device);

    let Some(credential) = read_credential(password_stdin)? else {
        println!("Operation cancelled.");
        return Ok(());
    };

    if !json {
        println!("Searching for {target} devices...");
    }

    let cancel = setup_interrupt_handler();
    let report = Reconciler::new(config.runner())
        .with_device_dir(config.device_dir.clone())
        .with_cancel_flag(cancel)
        .reconcile(target, &credential)?;
    drop(credential);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}
