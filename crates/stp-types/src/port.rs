//! Port identifiers and spanning tree port roles.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A stable per-bridge port index, assigned at configuration time.
///
/// Ports are numbered by their position in the bridge configuration, as
/// in `0`, `1`, `2`, ... The numbering is fixed for a simulation run and
/// participates in the comparator's final tie-break.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PortId(u16);

impl PortId {
    /// Creates a port ID from a raw index.
    pub const fn new(id: u16) -> Self {
        PortId(id)
    }

    /// Returns the raw index.
    pub const fn index(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for PortId {
    fn from(id: u16) -> Self {
        PortId(id)
    }
}

impl From<PortId> for u16 {
    fn from(id: PortId) -> u16 {
        id.0
    }
}

/// The spanning tree role of a port.
///
/// `Unknown` only occurs before the bridge has started; startup and the
/// aging reset drive every port to `Designated`, and received BPDUs move
/// ports between `Root`, `Designated` and `Blocked` from there.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PortRole {
    /// The port through which this bridge reaches the root.
    Root,
    /// The port is this bridge's forwarding attachment to a segment.
    Designated,
    /// The port is excluded from forwarding to break a topology loop.
    Blocked,
    /// The port has not yet taken part in the protocol.
    #[default]
    Unknown,
}

impl PortRole {
    /// Returns true if frames are forwarded on a port in this role.
    ///
    /// BPDUs are only emitted on forwarding ports; a blocked port still
    /// receives them.
    pub fn is_forwarding(&self) -> bool {
        matches!(self, PortRole::Root | PortRole::Designated)
    }

    /// Returns the canonical lowercase name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            PortRole::Root => "root",
            PortRole::Designated => "designated",
            PortRole::Blocked => "blocked",
            PortRole::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PortRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PortRole {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "root" => Ok(PortRole::Root),
            "designated" => Ok(PortRole::Designated),
            "blocked" => Ok(PortRole::Blocked),
            "unknown" => Ok(PortRole::Unknown),
            other => Err(ParseError::InvalidPortRole(other.to_string())),
        }
    }
}
