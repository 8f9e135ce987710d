//! udev control and diagnostic command handlers.

use super::{read_credential, CommandResult};
use octavi_udev::{hidraw_permissions, udev, Config, CommandOutput};

fn print_output(output: &CommandOutput) {
    if output.stdout.trim().is_empty() {
        println!("Command executed successfully.");
    } else {
        print!("{}", output.stdout);
    }
}

/// Reload udev rules
pub fn reload(config: &Config, password_stdin: bool) -> CommandResult {
    let Some(credential) = read_credential(password_stdin)? else {
        println!("Command cancelled.");
        return Ok(());
    };
    let output = udev::reload_rules(&config.runner(), &credential)?;
    print_output(&output);
    Ok(())
}

/// Trigger udev events so rules apply to connected devices
pub fn trigger(config: &Config, password_stdin: bool) -> CommandResult {
    let Some(credential) = read_credential(password_stdin)? else {
        println!("Command cancelled.");
        return Ok(());
    };
    let output = udev::trigger(&config.runner(), &credential)?;
    print_output(&output);
    Ok(())
}

/// Show `ls -l`-style permissions of all hidraw nodes
pub fn hidraw(config: &Config) -> CommandResult {
    let nodes = hidraw_permissions(&config.device_dir)?;
    if nodes.is_empty() {
        println!("No hidraw devices found.");
        return Ok(());
    }
    println!("Hidraw device permissions:\n");
    for node in nodes {
        println!("{node}");
    }
    Ok(())
}

/// Show kernel messages mentioning hidraw
pub fn dmesg(config: &Config, password_stdin: bool) -> CommandResult {
    let Some(credential) = read_credential(password_stdin)? else {
        println!("Command cancelled.");
        return Ok(());
    };
    let lines = udev::dmesg_hidraw(&config.runner(), &credential)?;
    if lines.is_empty() {
        println!("No hidraw messages in the kernel log.");
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}
