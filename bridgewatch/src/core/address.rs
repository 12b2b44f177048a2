//! Token address newtype.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::BridgeError;

/// Address of the token whose bridging pipeline is observed.
///
/// The original spelling is kept for display and storage keys. Matching
/// against payload addresses ignores ASCII case, since EVM addresses arrive
/// both checksummed and lowercased.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenAddress(String);

impl TokenAddress {
    /// Creates a token address, trimming surrounding whitespace.
    pub fn new(address: impl AsRef<str>) -> Result<Self, BridgeError> {
        let trimmed = address.as_ref().trim();
        if trimmed.is_empty() {
            return Err(BridgeError::Config("token address must not be empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the address as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if `other` names the same token.
    #[must_use]
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl PartialEq for TokenAddress {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl FromStr for TokenAddress {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TokenAddress {
    type Error = BridgeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TokenAddress> for String {
    fn from(address: TokenAddress) -> Self {
        address.0
    }
}

impl AsRef<str> for TokenAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
