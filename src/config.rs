//! User configuration
//!
//! Read from `~/.config/octavi-udev/config.toml` when present; every key is
//! optional and falls back to the Octavi IFR1 defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use udev_privilege::{Elevation, SudoRunner};

use crate::device_id::DeviceId;
use crate::hidraw::DEV_DIR;
use crate::rules::{DEFAULT_KEYWORD, DEFAULT_RULE_FILE, RULES_DIR};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Target device as `VVVV:PPPP`
    pub device: DeviceId,
    pub rules_dir: PathBuf,
    pub rule_file: String,
    /// Substring identifying related rule files
    pub rule_keyword: String,
    pub device_dir: PathBuf,
    pub sudo_path: String,
    /// Per-command timeout; 0 disables it
    pub command_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: DeviceId::OCTAVI_IFR1,
            rules_dir: PathBuf::from(RULES_DIR),
            rule_file: DEFAULT_RULE_FILE.to_string(),
            rule_keyword: DEFAULT_KEYWORD.to_string(),
            device_dir: PathBuf::from(DEV_DIR),
            sudo_path: "sudo".to_string(),
            command_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("octavi-udev")
            .join("config.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(config)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        (self.command_timeout_secs > 0).then(|| Duration::from_secs(self.command_timeout_secs))
    }

    /// Runner honouring `sudo_path` and the timeout
    pub fn runner(&self) -> SudoRunner {
        SudoRunner::new()
            .with_elevation(Elevation::sudo(self.sudo_path.clone()))
            .with_timeout(self.command_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.device.to_string(), "04d8:e6d6");
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "device = \"1209:BEEF\"\ncommand_timeout_secs = 0\nrule_file = \"70-beef.rules\"\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.device, DeviceId::new(0x1209, 0xBEEF));
        assert_eq!(config.rule_file, "70-beef.rules");
        assert_eq!(config.command_timeout(), None);
        assert_eq!(config.rules_dir, PathBuf::from(RULES_DIR));
        assert_eq!(config.runner().timeout(), None);
    }

    #[test]
    fn test_bad_device_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "device = \"4d8:e6d6\"\n").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_serializes() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, Config::default());
    }
}
