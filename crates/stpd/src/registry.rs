//! Port registry: the ordered, immutable set of bridge ports.

use crate::config::PortConfig;
use stp_types::{PathCost, PortId};

/// The bridge's ordered port collection.
///
/// Built once from validated configuration and never modified during a
/// run; both the announcer and the receiver loops iterate over it.
#[derive(Debug, Clone)]
pub struct PortRegistry {
    ports: Vec<PortConfig>,
}

impl PortRegistry {
    /// Creates a registry from validated port configuration.
    pub fn new(ports: Vec<PortConfig>) -> Self {
        PortRegistry { ports }
    }

    /// The ordered port list, stable for the run.
    pub fn ports(&self) -> &[PortConfig] {
        &self.ports
    }

    /// The link cost of a port, if it exists.
    pub fn cost(&self, port: PortId) -> Option<PathCost> {
        self.ports.iter().find(|p| p.id == port).map(|p| p.cost)
    }

    /// The port IDs, in configuration order.
    pub fn ids(&self) -> impl Iterator<Item = PortId> + '_ {
        self.ports.iter().map(|p| p.id)
    }

    /// Number of ports.
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// Returns true if the registry holds no ports.
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;

    fn registry() -> PortRegistry {
        let config = BridgeConfig::from_lan_ports("02ab".parse().unwrap(), &[9001, 9002]);
        PortRegistry::new(config.ports)
    }

    #[test]
    fn test_ordered_and_stable() {
        let registry = registry();
        let ids: Vec<_> = registry.ids().collect();
        assert_eq!(ids, vec![PortId::new(0), PortId::new(1)]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_cost_lookup() {
        let registry = registry();
        assert_eq!(registry.cost(PortId::new(0)), Some(PathCost::new(1)));
        assert_eq!(registry.cost(PortId::new(9)), None);
    }
}
