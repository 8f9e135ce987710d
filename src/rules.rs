//! udev rule files for USB device permissions
//!
//! Only the single rule shape this tool writes is understood:
//!
//! ```text
//! SUBSYSTEM=="usb", ATTR{idVendor}=="04d8", ATTR{idProduct}=="e6d6", MODE="0666"
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use tracing::info;
use udev_privilege::{CommandRunner, Credential};

use crate::device_id::{parse_hex4, DeviceId};
use crate::error::RuleError;

/// System udev rules directory
pub const RULES_DIR: &str = "/etc/udev/rules.d";
/// File name used by `create-rule`
pub const DEFAULT_RULE_FILE: &str = "99-octavi.rules";
/// Keyword for listing related rule files
pub const DEFAULT_KEYWORD: &str = "octavi";
/// Mode granted by the rule
pub const DEFAULT_MODE: u32 = 0o666;

/// Writes `$1` plus a newline to the file `$2`. Both are positional
/// parameters, so neither the rule text nor the path is parsed by the shell.
const WRITE_SCRIPT: &str = r#"printf '%s\n' "$1" > "$2""#;

/// One `SUBSYSTEM=="usb"` permission rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UdevRule {
    pub device: DeviceId,
    pub mode: u32,
}

impl UdevRule {
    pub fn new(device: DeviceId, mode: u32) -> Self {
        Self { device, mode }
    }
}

impl fmt::Display for UdevRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"SUBSYSTEM=="usb", ATTR{{idVendor}}=="{}", ATTR{{idProduct}}=="{}", MODE="{:04o}""#,
            self.device.vendor_hex(),
            self.device.product_hex(),
            self.mode
        )
    }
}

/// Parse an octal permission like `0666` or `666`
pub fn parse_mode(s: &str) -> Result<u32, RuleError> {
    if !(3..=4).contains(&s.len()) || !s.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
        return Err(RuleError::InvalidMode(s.to_string()));
    }
    u32::from_str_radix(s, 8).map_err(|_| RuleError::InvalidMode(s.to_string()))
}

/// Split `KEY=="value"` / `KEY="value"` into (key, value)
fn split_assignment(token: &str) -> Result<(&str, &str), RuleError> {
    let (key, rest) = token
        .split_once('=')
        .ok_or_else(|| RuleError::Malformed(token.to_string()))?;
    let rest = rest.strip_prefix('=').unwrap_or(rest);
    let value = rest
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or_else(|| RuleError::Malformed(token.to_string()))?;
    Ok((key.trim(), value))
}

impl FromStr for UdevRule {
    type Err = RuleError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut subsystem = None;
        let mut vendor = None;
        let mut product = None;
        let mut mode = None;

        for token in line.trim().split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let (key, value) = split_assignment(token)?;
            match key {
                "SUBSYSTEM" => subsystem = Some(value),
                "ATTR{idVendor}" | "ATTRS{idVendor}" => vendor = Some(value),
                "ATTR{idProduct}" | "ATTRS{idProduct}" => product = Some(value),
                "MODE" => mode = Some(value),
                _ => {}
            }
        }

        match subsystem {
            Some("usb") => {}
            Some(other) => return Err(RuleError::Malformed(format!("SUBSYSTEM {other}"))),
            None => return Err(RuleError::MissingKey("SUBSYSTEM")),
        }
        let vendor = parse_hex4(vendor.ok_or(RuleError::MissingKey("ATTR{idVendor}"))?)?;
        let product = parse_hex4(product.ok_or(RuleError::MissingKey("ATTR{idProduct}"))?)?;
        let mode = parse_mode(mode.ok_or(RuleError::MissingKey("MODE"))?)?;

        Ok(UdevRule::new(DeviceId::new(vendor, product), mode))
    }
}

/// Rules found in a file, skipping comments and unrelated lines
pub fn parse_rules(content: &str) -> Vec<UdevRule> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| l.parse().ok())
        .collect()
}

/// Reject anything but a bare `*.rules` file name
pub fn validate_file_name(name: &str) -> Result<(), RuleError> {
    let plain = !name.is_empty()
        && !name.starts_with('.')
        && !name.starts_with('-')
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
    if plain && name.ends_with(".rules") {
        Ok(())
    } else {
        Err(RuleError::InvalidFileName(name.to_string()))
    }
}

/// File names in `dir` containing `keyword` (case-insensitive), sorted
pub fn list_rule_files(dir: &Path, keyword: &str) -> Result<Vec<String>, RuleError> {
    let keyword = keyword.to_lowercase();
    let entries = fs::read_dir(dir).map_err(|source| RuleError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut names: Vec<String> = entries
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.to_lowercase().contains(&keyword))
        .collect();
    names.sort();
    Ok(names)
}

/// Contents of a rule file in `dir`
pub fn read_rule_file(dir: &Path, name: &str) -> Result<String, RuleError> {
    let path = dir.join(name);
    if Path::new(name).components().count() != 1 {
        return Err(RuleError::InvalidFileName(name.to_string()));
    }
    fs::read_to_string(&path).map_err(|source| RuleError::Io { path, source })
}

/// Write `rule` to `dir/file_name` with elevated privilege.
/// Returns the path written.
pub fn create_rule_file(
    runner: &impl CommandRunner,
    credential: &Credential,
    dir: &Path,
    file_name: &str,
    rule: &UdevRule,
) -> Result<PathBuf, RuleError> {
    validate_file_name(file_name)?;
    let path = dir.join(file_name);
    let line = rule.to_string();
    let target = path.to_string_lossy();

    info!("Writing udev rule to {}", target);
    runner.run("sh", &["-c", WRITE_SCRIPT, "write-rule", &line, &target], credential)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_default_rule() {
        let rule = UdevRule::new(DeviceId::OCTAVI_IFR1, DEFAULT_MODE);
        assert_eq!(
            rule.to_string(),
            r#"SUBSYSTEM=="usb", ATTR{idVendor}=="04d8", ATTR{idProduct}=="e6d6", MODE="0666""#
        );
    }

    #[test]
    fn test_round_trip() {
        let rule = UdevRule::new(DeviceId::new(0x1209, 0xBEEF), 0o660);
        let parsed: UdevRule = rule.to_string().parse().unwrap();
        assert_eq!(parsed, rule);
        assert_eq!(parsed.device.vendor_hex(), "1209");
        assert_eq!(parsed.mode, 0o660);
    }

    #[test]
    fn test_parse_uppercase_and_attrs() {
        let rule: UdevRule =
            r#"SUBSYSTEM=="usb", ATTRS{idVendor}=="04D8", ATTRS{idProduct}=="E6D6", MODE="666""#
                .parse()
                .unwrap();
        assert_eq!(rule, UdevRule::new(DeviceId::OCTAVI_IFR1, 0o666));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            r#"ATTR{idVendor}=="04d8", ATTR{idProduct}=="e6d6", MODE="0666""#.parse::<UdevRule>(),
            Err(RuleError::MissingKey("SUBSYSTEM"))
        ));
        assert!(matches!(
            r#"SUBSYSTEM=="hidraw", MODE="0666""#.parse::<UdevRule>(),
            Err(RuleError::Malformed(_))
        ));
        assert!(matches!(
            r#"SUBSYSTEM=="usb", ATTR{idVendor}=="04d8", ATTR{idProduct}=="e6d6", MODE="0999""#
                .parse::<UdevRule>(),
            Err(RuleError::InvalidMode(_))
        ));
        assert!(matches!(
            r#"SUBSYSTEM=="usb", ATTR{idVendor}=="4d8", ATTR{idProduct}=="e6d6", MODE="0666""#
                .parse::<UdevRule>(),
            Err(RuleError::Id(_))
        ));
    }

    #[test]
    fn test_parse_rules_skips_comments() {
        let content = "# Octavi IFR1\n\nSUBSYSTEM==\"usb\", ATTR{idVendor}==\"04d8\", ATTR{idProduct}==\"e6d6\", MODE=\"0666\"\nKERNEL==\"hidraw*\", TAG+=\"uaccess\"\n";
        assert_eq!(
            parse_rules(content),
            vec![UdevRule::new(DeviceId::OCTAVI_IFR1, 0o666)]
        );
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("0666").unwrap(), 0o666);
        assert_eq!(parse_mode("644").unwrap(), 0o644);
        assert!(parse_mode("66").is_err());
        assert!(parse_mode("06666").is_err());
        assert!(parse_mode("rw").is_err());
    }

    #[test]
    fn test_validate_file_name() {
        assert!(validate_file_name("99-octavi.rules").is_ok());
        assert!(validate_file_name("../99-octavi.rules").is_err());
        assert!(validate_file_name("sub/99-octavi.rules").is_err());
        assert!(validate_file_name("99-octavi.conf").is_err());
        assert!(validate_file_name("-x.rules").is_err());
        assert!(validate_file_name("a b.rules").is_err());
    }

    #[test]
    fn test_list_and_read() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("99-Octavi.rules"), "x").unwrap();
        fs::write(dir.path().join("50-octavi-ifr1.rules"), "y").unwrap();
        fs::write(dir.path().join("70-uaccess.rules"), "z").unwrap();

        let names = list_rule_files(dir.path(), "octavi").unwrap();
        assert_eq!(names, ["50-octavi-ifr1.rules", "99-Octavi.rules"]);
        assert_eq!(read_rule_file(dir.path(), "99-Octavi.rules").unwrap(), "x");
        assert!(matches!(
            read_rule_file(dir.path(), "../passwd"),
            Err(RuleError::InvalidFileName(_))
        ));
    }
}
