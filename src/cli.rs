// CLI definitions using clap

use clap::{Parser, Subcommand};
use octavi_udev::DeviceId;
use std::path::PathBuf;

const INSTRUCTIONS: &str = "\
Actions:
  list              List Octavi-related udev rules
  show <FILE>       Display a rule file
  reload            Reload udev rules (requires sudo)
  trigger           Trigger udev rules (requires sudo)
  hidraw            Display permissions for hidraw devices
  dmesg             Show hidraw-related kernel messages (requires sudo)
  create-rule       Create a new udev rule for the device (requires sudo)
  find              Search for the device and set permissions (requires sudo)

Actions marked (requires sudo) prompt for your password.";

#[derive(Parser)]
#[command(name = "octavi-udev")]
#[command(author, version, about = "udev rule and hidraw permission manager for the Octavi IFR1")]
#[command(after_help = INSTRUCTIONS)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path (default: ~/.config/octavi-udev/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Read the sudo password from the first line of stdin instead of prompting
    #[arg(long, global = true)]
    pub password_stdin: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List udev rule files matching the configured keyword
    #[command(visible_alias = "ls")]
    List,

    /// Display the contents of a rule file
    #[command(visible_alias = "cat")]
    Show {
        /// File name inside the rules directory
        file: String,
    },

    /// Reload udev rules (requires sudo)
    Reload,

    /// Trigger udev rules (requires sudo)
    Trigger,

    /// Display permissions for hidraw devices
    #[command(visible_alias = "perms")]
    Hidraw,

    /// Show hidraw-related kernel messages (requires sudo)
    Dmesg,

    /// Create a udev rule granting access to the device (requires sudo)
    #[command(visible_alias = "create")]
    CreateRule {
        /// Device as VVVV:PPPP (default: from config)
        #[arg(short, long)]
        device: Option<DeviceId>,
        /// Octal mode granted by the rule
        #[arg(short, long, default_value = "0666")]
        mode: String,
        /// Rule file name (default: from config)
        #[arg(short, long)]
        file: Option<String>,
        /// Reload and trigger udev afterwards
        #[arg(long)]
        apply: bool,
    },

    /// Find attached devices and chmod their hidraw nodes to 0666 (requires sudo)
    #[command(visible_alias = "scan")]
    Find {
        /// Device as VVVV:PPPP (default: from config)
        #[arg(short, long)]
        device: Option<DeviceId>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show usage instructions
    Instructions,
}

pub fn instructions() -> &'static str {
    INSTRUCTIONS
}
