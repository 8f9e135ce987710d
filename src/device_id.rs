//! USB vendor/product identifiers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Octavi vendor ID (Microchip)
pub const VID_OCTAVI: u16 = 0x04D8;
/// Octavi IFR1 product ID
pub const PID_IFR1: u16 = 0xE6D6;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceIdError {
    #[error("'{0}' is not a 4-digit hex ID")]
    InvalidHex(String),

    #[error("expected VVVV:PPPP, got '{0}'")]
    InvalidPair(String),
}

/// A USB (vendor, product) pair.
///
/// Parsed from exactly four hex digits per half, so comparison is
/// case-insensitive (`04d8` == `04D8`) and never a prefix match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId {
    pub vendor: u16,
    pub product: u16,
}

impl DeviceId {
    pub const OCTAVI_IFR1: DeviceId = DeviceId::new(VID_OCTAVI, PID_IFR1);

    pub const fn new(vendor: u16, product: u16) -> Self {
        Self { vendor, product }
    }

    /// Build from the two hex halves, e.g. `("04d8", "E6D6")`
    pub fn from_hex(vendor: &str, product: &str) -> Result<Self, DeviceIdError> {
        Ok(Self {
            vendor: parse_hex4(vendor)?,
            product: parse_hex4(product)?,
        })
    }

    /// Lowercase vendor ID as written in udev rules
    pub fn vendor_hex(&self) -> String {
        format!("{:04x}", self.vendor)
    }

    /// Lowercase product ID as written in udev rules
    pub fn product_hex(&self) -> String {
        format!("{:04x}", self.product)
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        Self::OCTAVI_IFR1
    }
}

/// Parse exactly four hex digits
pub fn parse_hex4(s: &str) -> Result<u16, DeviceIdError> {
    if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(DeviceIdError::InvalidHex(s.to_string()));
    }
    u16::from_str_radix(s, 16).map_err(|_| DeviceIdError::InvalidHex(s.to_string()))
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor, self.product)
    }
}

impl FromStr for DeviceId {
    type Err = DeviceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (vendor, product) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| DeviceIdError::InvalidPair(s.to_string()))?;
        Self::from_hex(vendor, product)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = DeviceIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive() {
        let lower = DeviceId::from_hex("04d8", "e6d6").unwrap();
        let upper = DeviceId::from_hex("04D8", "E6D6").unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower, DeviceId::OCTAVI_IFR1);
    }

    #[test]
    fn test_exact_width() {
        assert!(parse_hex4("4d8").is_err());
        assert!(parse_hex4("04d80").is_err());
        assert!(parse_hex4("+4d8").is_err());
        assert!(parse_hex4("04g8").is_err());
        assert_eq!(parse_hex4("ffff"), Ok(0xFFFF));
    }

    #[test]
    fn test_parse_and_display() {
        let id: DeviceId = "04D8:E6D6".parse().unwrap();
        assert_eq!(id.to_string(), "04d8:e6d6");
        assert_eq!(id.vendor_hex(), "04d8");
        assert_eq!(id.product_hex(), "e6d6");
        assert_eq!(
            "04d8e6d6".parse::<DeviceId>(),
            Err(DeviceIdError::InvalidPair("04d8e6d6".into()))
        );
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&DeviceId::new(0x1234, 0xabcd)).unwrap();
        assert_eq!(json, "\"1234:abcd\"");
        let back: DeviceId = serde_json::from_str("\"1234:ABCD\"").unwrap();
        assert_eq!(back, DeviceId::new(0x1234, 0xABCD));
    }
}
