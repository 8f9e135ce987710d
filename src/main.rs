//! Octavi IFR1 udev helper CLI
//!
//! Lists and creates udev rules, inspects hidraw nodes, and finds attached
//! devices to open up their permissions.

use clap::Parser;
use octavi_udev::Config;
use tracing::debug;

// CLI definitions
mod cli;
use cli::{Cli, Commands};

// Command handlers
mod commands;

fn setup_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    debug!("Loading config from {:?}", config_path);
    let config = Config::load(&config_path)?;

    match cli.command {
        None | Some(Commands::List) => commands::rules::list(&config)?,
        Some(Commands::Show { file }) => commands::rules::show(&config, &file)?,
        Some(Commands::Reload) => commands::system::reload(&config, cli.password_stdin)?,
        Some(Commands::Trigger) => commands::system::trigger(&config, cli.password_stdin)?,
        Some(Commands::Hidraw) => commands::system::hidraw(&config)?,
        Some(Commands::Dmesg) => commands::system::dmesg(&config, cli.password_stdin)?,
        Some(Commands::CreateRule {
            device,
            mode,
            file,
            apply,
        }) => commands::rules::create_rule(
            &config,
            device,
            &mode,
            file.as_deref(),
            apply,
            cli.password_stdin,
        )?,
        Some(Commands::Find { device, json }) => {
            commands::devices::find(&config, device, json, cli.password_stdin)?
        }
        Some(Commands::Instructions) => println!("{}", cli::instructions()),
    }

    Ok(())
}
