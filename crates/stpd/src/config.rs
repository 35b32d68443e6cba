//! Bridge configuration support.
//!
//! Loads and validates the bridge configuration: this bridge's ID, the
//! fixed list of ports with their link costs and LAN attachments, and
//! the protocol timing constants. Configuration is supplied once at
//! startup; there is no hot-reload.

use crate::error::{Result, StpdError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;
use stp_types::{BridgeId, PathCost, PortId};

/// Default hello interval in milliseconds.
///
/// Must be uniform across the simulated network for the convergence
/// guarantees to hold.
pub const DEFAULT_HELLO_INTERVAL_MS: u64 = 500;

/// Default number of hello intervals without confirmation before the
/// belief about the root is considered stale.
pub const DEFAULT_MAX_AGE_INTERVALS: u32 = 3;

/// Default link cost for ports configured without an explicit cost.
pub const DEFAULT_LINK_COST: u32 = 1;

/// A single port definition: stable ID, link cost and the UDP port of
/// the LAN segment it attaches to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfig {
    /// Stable port identifier (position in the configuration).
    pub id: PortId,

    /// Link cost used in path-cost comparisons. Must be positive.
    #[serde(default = "default_link_cost")]
    pub cost: PathCost,

    /// UDP port of the LAN segment this port connects to.
    pub lan: u16,
}

/// Complete bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// This bridge's identifier.
    pub bridge_id: BridgeId,

    /// Ordered port list, fixed for the run.
    pub ports: Vec<PortConfig>,

    /// Interval between BPDU announcements, in milliseconds.
    #[serde(default = "default_hello_interval_ms")]
    pub hello_interval_ms: u64,

    /// Number of hello intervals before an unconfirmed root belief is
    /// aged out.
    #[serde(default = "default_max_age_intervals")]
    pub max_age_intervals: u32,
}

fn default_hello_interval_ms() -> u64 {
    DEFAULT_HELLO_INTERVAL_MS
}

fn default_max_age_intervals() -> u32 {
    DEFAULT_MAX_AGE_INTERVALS
}

fn default_link_cost() -> PathCost {
    PathCost::new(DEFAULT_LINK_COST)
}

impl BridgeConfig {
    /// Builds a configuration from the command-line shape: a bridge ID
    /// and one LAN UDP port per bridge port, all with the default cost.
    ///
    /// Port IDs are assigned positionally, starting at 0.
    pub fn from_lan_ports(bridge_id: BridgeId, lan_ports: &[u16]) -> Self {
        let ports = lan_ports
            .iter()
            .enumerate()
            .map(|(i, &lan)| PortConfig {
                id: PortId::new(i as u16),
                cost: default_link_cost(),
                lan,
            })
            .collect();

        BridgeConfig {
            bridge_id,
            ports,
            hello_interval_ms: DEFAULT_HELLO_INTERVAL_MS,
            max_age_intervals: DEFAULT_MAX_AGE_INTERVALS,
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| StpdError::ConfigFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let config: BridgeConfig =
            toml::from_str(&contents).map_err(|e| StpdError::ConfigFile {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Rejects an empty port list, duplicate port IDs, non-positive
    /// link costs, duplicate LAN attachments (a bridge that attaches
    /// twice to the same segment would loop onto itself) and degenerate
    /// timing constants.
    pub fn validate(&self) -> Result<()> {
        if self.ports.is_empty() {
            return Err(StpdError::invalid_config(
                "ports",
                "at least one port is required",
            ));
        }

        let mut seen_ids = HashSet::new();
        let mut seen_lans = HashSet::new();
        for port in &self.ports {
            if !seen_ids.insert(port.id) {
                return Err(StpdError::invalid_config(
                    "ports",
                    format!("duplicate port ID: {}", port.id),
                ));
            }
            if !seen_lans.insert(port.lan) {
                return Err(StpdError::invalid_config(
                    "ports",
                    format!("duplicate LAN attachment: {}", port.lan),
                ));
            }
            if port.cost == PathCost::ZERO {
                return Err(StpdError::invalid_config(
                    "ports",
                    format!("port {} has non-positive link cost", port.id),
                ));
            }
        }

        if self.hello_interval_ms == 0 {
            return Err(StpdError::invalid_config(
                "hello_interval_ms",
                "must be positive",
            ));
        }
        if self.max_age_intervals == 0 {
            return Err(StpdError::invalid_config(
                "max_age_intervals",
                "must be positive",
            ));
        }

        Ok(())
    }

    /// The announcement interval.
    pub fn hello_interval(&self) -> Duration {
        Duration::from_millis(self.hello_interval_ms)
    }

    /// The aging timeout: `max_age_intervals` hello intervals.
    pub fn max_age(&self) -> Duration {
        self.hello_interval() * self.max_age_intervals
    }
}
