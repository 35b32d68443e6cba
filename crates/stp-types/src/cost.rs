//! Path cost arithmetic for root-path comparisons.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A spanning tree path cost.
///
/// Link costs configured on a port must be positive; a cost-to-root of
/// zero means the bridge believes itself root. Addition saturates so a
/// pathological topology cannot wrap a cost back to a "better" value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PathCost(u32);

impl PathCost {
    /// The zero cost: a root bridge's cost to itself.
    pub const ZERO: PathCost = PathCost(0);

    /// Creates a path cost from a raw value.
    pub const fn new(cost: u32) -> Self {
        PathCost(cost)
    }

    /// Returns the raw cost value.
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Adds a link cost onto this path cost, saturating at `u32::MAX`.
    pub const fn plus(&self, link: PathCost) -> PathCost {
        PathCost(self.0.saturating_add(link.0))
    }
}

impl fmt::Display for PathCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PathCost {
    fn from(cost: u32) -> Self {
        PathCost(cost)
    }
}

impl From<PathCost> for u32 {
    fn from(cost: PathCost) -> u32 {
        cost.0
    }
}
