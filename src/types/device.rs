//! Serial device types.

use std::fmt;

/// A serial endpoint visible to the operating system.
///
/// This is a snapshot taken at enumeration time; ports are re-enumerated on
/// every discovery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialEndpoint {
    /// Port path (e.g., "/dev/ttyACM0" or "COM3").
    pub id: String,
    /// Human readable description used for device matching.
    pub descriptor: String,
}

impl SerialEndpoint {
    /// Creates a new endpoint.
    #[must_use]
    pub fn new(id: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            descriptor: descriptor.into(),
        }
    }

    /// Returns true if the descriptor contains `keyword`, ignoring case.
    #[must_use]
    pub fn matches(&self, keyword: &str) -> bool {
        self.descriptor
            .to_lowercase()
            .contains(&keyword.to_lowercase())
    }
}

impl fmt::Display for SerialEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.id, self.descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_ignores_case() {
        let endpoint = SerialEndpoint::new("/dev/ttyACM0", "nice!nano v2 USB Serial");
        assert!(endpoint.matches("usb serial"));
        assert!(endpoint.matches("NICE"));
        assert!(!endpoint.matches("arduino"));
    }

    #[test]
    fn test_display() {
        let endpoint = SerialEndpoint::new("COM3", "Arduino Uno");
        assert_eq!(endpoint.to_string(), "COM3 - Arduino Uno");
    }
}
