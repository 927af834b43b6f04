// ABOUTME: Bounded C-string newtype for SMPP protocol fields
// ABOUTME: Enforces per-field octet limits at construction instead of encode time

use std::fmt;
use std::str::FromStr;

/// A protocol string bounded to `N` octets on the wire, NUL terminator
/// included. Construction fails when the value would not fit, so encode
/// paths never have to re-check lengths.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct FixedString<const N: usize> {
    value: String,
}

impl<const N: usize> FixedString<N> {
    /// Maximum content length (the wire field reserves one octet for NUL).
    pub const MAX: usize = N - 1;

    pub fn new(value: impl Into<String>) -> Result<Self, FixedStringError> {
        let value = value.into();
        if value.len() > Self::MAX {
            return Err(FixedStringError::TooLong {
                max_len: Self::MAX,
                actual_len: value.len(),
            });
        }
        Ok(Self { value })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl<const N: usize> fmt::Display for FixedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<const N: usize> fmt::Debug for FixedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedString<{N}>({:?})", self.value)
    }
}

impl<const N: usize> FromStr for FixedString<N> {
    type Err = FixedStringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<const N: usize> TryFrom<String> for FixedString<N> {
    type Error = FixedStringError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl<const N: usize> AsRef<str> for FixedString<N> {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl<const N: usize> PartialEq<&str> for FixedString<N> {
    fn eq(&self, other: &&str) -> bool {
        self.value == *other
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FixedStringError {
    #[error("string too long: {actual_len} bytes (max {max_len})")]
    TooLong { max_len: usize, actual_len: usize },
}

// Field sizes per SMPP v3.4 section 5.2 (octets on the wire, NUL included).
pub type SystemId = FixedString<16>;
pub type Password = FixedString<9>;
pub type SystemType = FixedString<13>;
pub type ServiceType = FixedString<6>;
pub type AddressRange = FixedString<41>;
pub type SmeAddress = FixedString<21>;
pub type MessageId = FixedString<65>;
pub type TimeString = FixedString<17>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_bound() {
        let id = SystemId::new("gateway01").unwrap();
        assert_eq!(id.as_str(), "gateway01");
        assert_eq!(id.len(), 9);
    }

    #[test]
    fn at_bound() {
        assert!(SystemId::new("a".repeat(15)).is_ok());
        assert!(Password::new("12345678").is_ok());
    }

    #[test]
    fn over_bound() {
        assert!(matches!(
            SystemId::new("a".repeat(16)),
            Err(FixedStringError::TooLong {
                max_len: 15,
                actual_len: 16
            })
        ));
        assert!(Password::new("123456789").is_err());
    }

    #[test]
    fn default_is_empty() {
        let addr = SmeAddress::default();
        assert!(addr.is_empty());
        assert_eq!(addr.as_str(), "");
    }
}
