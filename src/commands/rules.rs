//! Rule file command handlers.

use super::{read_credential, CommandResult};
use octavi_udev::rules::{self, parse_mode, UdevRule};
use octavi_udev::{udev, Config, DeviceId};

/// List rule files whose name contains the configured keyword
pub fn list(config: &Config) -> CommandResult {
    let names = rules::list_rule_files(&config.rules_dir, &config.rule_keyword)?;
    if names.is_empty() {
        println!("No {} rules found.", config.rule_keyword);
        return Ok(());
    }
    println!("Found {} {} rule(s):", names.len(), config.rule_keyword);
    for name in names {
        println!("  {name}");
    }
    Ok(())
}

/// Print a rule file and the permission rules it contains
pub fn show(config: &Config, file: &str) -> CommandResult {
    let content = rules::read_rule_file(&config.rules_dir, file)?;
    print!("{content}");
    if !content.ends_with('\n') {
        println!();
    }
    for rule in rules::parse_rules(&content) {
        tracing::debug!("{}: grants {:04o} to {}", file, rule.mode, rule.device);
    }
    Ok(())
}

/// Write a udev rule for `device`, optionally reloading and triggering udev
pub fn create_rule(
    config: &Config,
    device: Option<DeviceId>,
    mode: &str,
    file: Option<&str>,
    apply: bool,
    password_stdin: bool,
) -> CommandResult {
    let rule = UdevRule::new(device.unwrap_or(config.device), parse_mode(mode)?);
    let file = file.unwrap_or(config.rule_file.as_str());

    let Some(credential) = read_credential(password_stdin)? else {
        println!("Command cancelled.");
        return Ok(());
    };

    let runner = config.runner();
    let path = rules::create_rule_file(&runner, &credential, &config.rules_dir, file, &rule)?;
    println!("Created {}:", path.display());
    println!("  {rule}");

    if apply {
        udev::reload_rules(&runner, &credential)?;
        udev::trigger(&runner, &credential)?;
        println!("Rules reloaded and triggered.");
    } else {
        println!("Reload rules and trigger udev for the change to take effect.");
    }
    Ok(())
}
