//! Host port types and port conflict resolution.
//!
//! This module provides the [`Port`] newtype used for published host ports,
//! and the [`conflict`] submodule that detects and resolves host port
//! collisions across merged services.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod conflict;

#[cfg(all(test, feature = "property-tests"))]
mod proptests;

pub use conflict::{ConflictSet, PortConflictResolver, SkippedBinding, DEFAULT_PORT_OFFSET};

/// A valid network port number (1-65535).
///
/// Port 0 is considered invalid as it asks the engine for an ephemeral port
/// and can never collide.
///
/// # Examples
///
/// ```
/// use qec::Port;
///
/// let port = Port::try_from(8080).unwrap();
/// assert_eq!(port.value(), 8080);
/// assert!(Port::try_from(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Port(u16);

impl Port {
    /// The minimum valid port number.
    pub const MIN: u16 = 1;

    /// The maximum valid port number.
    pub const MAX: u16 = 65535;

    /// Returns the underlying port number.
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Parses a published host port as written in a compose document.
    ///
    /// Returns `None` for anything that is not a single decimal port in
    /// 1-65535: empty strings, ranges like `8000-8010`, `0`, or garbage.
    ///
    /// # Examples
    ///
    /// ```
    /// use qec::Port;
    ///
    /// assert_eq!(Port::parse_published("443").map(Port::value), Some(443));
    /// assert_eq!(Port::parse_published(" 80 ").map(Port::value), Some(80));
    /// assert!(Port::parse_published("8000-8010").is_none());
    /// assert!(Port::parse_published("").is_none());
    /// assert!(Port::parse_published("70000").is_none());
    /// ```
    #[must_use]
    pub fn parse_published(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        trimmed
            .parse::<u16>()
            .ok()
            .and_then(|v| Self::try_from(v).ok())
    }

    /// Shifts the port by `offset * index`, or `None` past 65535.
    ///
    /// # Examples
    ///
    /// ```
    /// use qec::Port;
    ///
    /// let http = Port::try_from(80).unwrap();
    /// assert_eq!(http.shifted(100, 0), Some(http));
    /// assert_eq!(http.shifted(100, 2).map(Port::value), Some(280));
    /// assert!(Port::try_from(65500).unwrap().shifted(100, 1).is_none());
    /// ```
    #[must_use]
    pub fn shifted(self, offset: u16, index: usize) -> Option<Self> {
        let index = u32::try_from(index).ok()?;
        let shifted = u32::from(self.0).checked_add(u32::from(offset).checked_mul(index)?)?;
        u16::try_from(shifted).ok().map(Self)
    }
}

impl TryFrom<u16> for Port {
    type Error = InvalidPortError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if value == 0 {
            Err(InvalidPortError {
                value,
                reason: "port 0 is invalid".into(),
            })
        } else {
            Ok(Self(value))
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for invalid port numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPortError {
    /// The invalid port value.
    pub value: u16,
    /// The reason the port is invalid.
    pub reason: String,
}

impl fmt::Display for InvalidPortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid port {}: {}", self.value, self.reason)
    }
}

impl std::error::Error for InvalidPortError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_validation() {
        assert!(Port::try_from(1).is_ok());
        assert!(Port::try_from(65535).is_ok());
        let err = Port::try_from(0).unwrap_err();
        assert_eq!(err.value, 0);
        assert!(err.to_string().contains("port 0 is invalid"));
    }

    #[test]
    fn test_parse_published_rejects_non_decimal() {
        assert!(Port::parse_published("+80").is_none());
        assert!(Port::parse_published("0x50").is_none());
        assert!(Port::parse_published("http").is_none());
        assert!(Port::parse_published("0").is_none());
    }

    #[test]
    fn test_parse_published_accepts_leading_zeros() {
        assert_eq!(Port::parse_published("0080").map(Port::value), Some(80));
    }

    #[test]
    fn test_shifted_boundaries() {
        let port = Port::try_from(65435).unwrap();
        assert_eq!(port.shifted(100, 1).map(Port::value), Some(65535));
        assert!(port.shifted(101, 1).is_none());
        assert!(port.shifted(u16::MAX, usize::MAX).is_none());
    }

    #[test]
    fn test_port_ordering() {
        let a = Port::try_from(80).unwrap();
        let b = Port::try_from(443).unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_port_serde() {
        let port = Port::try_from(8080).unwrap();
        let json = serde_json::to_string(&port).unwrap();
        assert_eq!(json, "8080");
        let back: Port = serde_json::from_str(&json).unwrap();
        assert_eq!(back, port);
    }
}
