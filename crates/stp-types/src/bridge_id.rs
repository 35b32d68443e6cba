//! Bridge identifier type with safe parsing and formatting.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A bridge identifier: a short hexadecimal string such as `02ab`.
///
/// Bridge IDs are totally ordered (lexicographic over the normalized
/// lowercase form), which is what makes spanning tree tie-breaks
/// deterministic: the bridge with the smallest ID in the network wins
/// the root election.
///
/// # Examples
///
/// ```
/// use stp_types::BridgeId;
///
/// let a: BridgeId = "02ab".parse().unwrap();
/// let b: BridgeId = "92f0".parse().unwrap();
/// assert!(a < b);
/// assert_eq!(a.to_string(), "02ab");
///
/// // Uppercase input is normalized
/// let c: BridgeId = "02AB".parse().unwrap();
/// assert_eq!(a, c);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BridgeId(String);

impl BridgeId {
    /// Maximum identifier length in hex digits.
    pub const MAX_LEN: usize = 16;

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BridgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BridgeId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty()
            || s.len() > Self::MAX_LEN
            || !s.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(ParseError::InvalidBridgeId(s.to_string()));
        }
        Ok(BridgeId(s.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for BridgeId {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<BridgeId> for String {
    fn from(id: BridgeId) -> String {
        id.0
    }
}
