//! Address - normalized subject identifier
//!
//! Borrowers, the ledger owner and scored freelancers are all identified by a
//! `0x`-prefixed hex address. Parsing normalizes to lowercase so that the same
//! wallet always maps to the same ledger and score-store keys.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AddressError;

/// Minimum decoded address length in bytes
pub const MIN_ADDRESS_BYTES: usize = 4;

/// Normalized `0x`-prefixed hex address
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and normalize an address
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let normalized = raw.trim().to_lowercase();

        let body = normalized
            .strip_prefix("0x")
            .ok_or_else(|| AddressError::Invalid(raw.to_string()))?;

        let bytes = hex::decode(body).map_err(|_| AddressError::Invalid(raw.to_string()))?;
        if bytes.len() < MIN_ADDRESS_BYTES {
            return Err(AddressError::Invalid(raw.to_string()));
        }

        Ok(Self(normalized))
    }

    /// Normalized string form
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for log lines (`0x1234…abcd`)
    pub fn short(&self) -> String {
        if self.0.len() <= 12 {
            return self.0.clone();
        }
        format!("{}…{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case() {
        let addr = Address::parse("  0xABCDEF0123456789abcdef0123456789ABCDEF01 ").unwrap();
        assert_eq!(addr.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn test_rejects_missing_prefix() {
        assert!(Address::parse("abcdef0123456789").is_err());
    }

    #[test]
    fn test_rejects_short_or_non_hex() {
        assert!(Address::parse("0x1234").is_err());
        assert!(Address::parse("0xzzzzzzzzzz").is_err());
        assert!(Address::parse("0x123456789").is_err()); // odd length
    }

    #[test]
    fn test_serde_roundtrip_validates() {
        let json = "\"0xAAAAAAAAAA\"";
        let addr: Address = serde_json::from_str(json).unwrap();
        assert_eq!(addr.as_str(), "0xaaaaaaaaaa");
        assert!(serde_json::from_str::<Address>("\"nope\"").is_err());
    }

    #[test]
    fn test_short_form() {
        let addr = Address::parse("0xabcdef0123456789abcdef0123456789abcdef01").unwrap();
        assert_eq!(addr.short(), "0xabcd…ef01");
    }
}
