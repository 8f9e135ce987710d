//! Parsing of `udevadm info --query=all` output
//!
//! A hidraw node's record looks like:
//!
//! ```text
//! P: /devices/pci0000:00/.../0003:04D8:E6D6.0004/hidraw/hidraw3
//! N: hidraw3
//! E: DEVPATH=/devices/pci0000:00/.../0003:04D8:E6D6.0004/hidraw/hidraw3
//! E: DEVNAME=/dev/hidraw3
//! E: SUBSYSTEM=hidraw
//! ```
//!
//! The HID device directory name is `BBBB:VVVV:PPPP.IIII`; bus `0003` is USB.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::device_id::{parse_hex4, DeviceId};

/// HID bus type for USB
pub const BUS_USB: &str = "0003";

fn usb_devpath_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r".*{BUS_USB}:([0-9A-Fa-f]{{4}}):([0-9A-Fa-f]{{4}})"))
            .expect("static regex is valid")
    })
}

/// Key/value view of a metadata record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceMetadata {
    pub properties: BTreeMap<String, String>,
}

impl DeviceMetadata {
    /// Collect `E: KEY=VALUE` (and bare `KEY=VALUE`) lines
    pub fn parse(record: &str) -> Self {
        let properties = record
            .lines()
            .filter_map(|line| {
                let line = line.trim();
                let line = line.strip_prefix("E:").map(str::trim_start).unwrap_or(line);
                let (key, value) = line.split_once('=')?;
                if key.is_empty() || key.contains(char::is_whitespace) {
                    return None;
                }
                Some((key.to_string(), value.to_string()))
            })
            .collect();
        Self { properties }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn devpath(&self) -> Option<&str> {
        self.get("DEVPATH")
    }

    pub fn devname(&self) -> Option<&str> {
        self.get("DEVNAME")
    }

    /// USB vendor/product pair from the last `0003:VVVV:PPPP` segment of
    /// `DEVPATH`.
    ///
    /// `None` when the device is not on the USB bus (Bluetooth, I2C, uhid)
    /// or the record has no `DEVPATH` at all.
    pub fn usb_ids(&self) -> Option<DeviceId> {
        let caps = usb_devpath_regex().captures(self.devpath()?)?;
        let vendor = parse_hex4(caps.get(1)?.as_str()).ok()?;
        let product = parse_hex4(caps.get(2)?.as_str()).ok()?;
        Some(DeviceId::new(vendor, product))
    }

    /// Whether the record belongs to `target`
    pub fn matches(&self, target: DeviceId) -> bool {
        self.usb_ids() == Some(target)
    }
}
