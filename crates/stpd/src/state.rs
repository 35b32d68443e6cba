//! The mutable bridge state and its exclusive-access discipline.
//!
//! One [`BridgeState`] instance is shared between the announcer and all
//! receiver loops. Every read and write goes through a single mutex, so
//! the belief about the root and the per-port roles always change
//! together; no task can observe a half-applied update. No await point
//! is ever held across the lock.

use crate::bpdu::Bpdu;
use crate::comparator::{self, Adoption, Belief, Verdict};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use stp_types::{BridgeId, PathCost, PortId, PortRole};
use tokio::time::Instant;
use tracing::{debug, info};

/// The role of one port, as visible to external tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortStatus {
    pub id: PortId,
    pub role: PortRole,
}

/// A consistent snapshot of the bridge's belief and port roles.
///
/// Produced under one lock acquisition; the belief fields and the role
/// list are mutually consistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeView {
    /// This bridge's own ID.
    pub bridge_id: BridgeId,
    /// The believed root bridge.
    pub root: BridgeId,
    /// The believed cost to the root.
    pub cost: PathCost,
    /// The neighbor one BPDU away from the root; own ID when self-root.
    pub next_hop: BridgeId,
    /// The port through which the root is reached; None when self-root.
    pub root_port: Option<PortId>,
    /// Whether the belief rests on a confirmation from upstream.
    pub confirmed: bool,
    /// Per-port roles, in configuration order.
    pub ports: Vec<PortStatus>,
}

impl BridgeView {
    /// Returns true if this bridge believes itself root.
    pub fn is_root_bridge(&self) -> bool {
        self.root == self.bridge_id
    }

    /// The role of a port, if it exists.
    pub fn role_of(&self, port: PortId) -> Option<PortRole> {
        self.ports.iter().find(|p| p.id == port).map(|p| p.role)
    }

    /// Number of ports currently blocked.
    pub fn blocked_count(&self) -> usize {
        self.ports
            .iter()
            .filter(|p| p.role == PortRole::Blocked)
            .count()
    }
}

struct Inner {
    root: BridgeId,
    cost: PathCost,
    next_hop: BridgeId,
    root_port: Option<PortId>,
    /// When the belief was last corroborated; None while self-root.
    last_confirmed: Option<Instant>,
    roles: BTreeMap<PortId, PortRole>,
}

/// The singular mutable record owned by the bridge process.
///
/// A bridge starts by assuming itself root: `root` is its own ID, cost
/// is zero, there is no root port, and the belief is unconfirmed.
pub struct BridgeState {
    own_id: BridgeId,
    inner: Mutex<Inner>,
}

impl BridgeState {
    /// Creates the initial state for a bridge with the given ports.
    ///
    /// Ports begin in the `Unknown` role; [`BridgeState::start`] moves
    /// them to `Designated` when the daemon begins announcing.
    pub fn new(own_id: BridgeId, ports: impl IntoIterator<Item = PortId>) -> Self {
        let roles = ports
            .into_iter()
            .map(|id| (id, PortRole::Unknown))
            .collect();
        BridgeState {
            inner: Mutex::new(Inner {
                root: own_id.clone(),
                cost: PathCost::ZERO,
                next_hop: own_id.clone(),
                root_port: None,
                last_confirmed: None,
                roles,
            }),
            own_id,
        }
    }

    /// This bridge's own ID.
    pub fn own_id(&self) -> &BridgeId {
        &self.own_id
    }

    /// Marks every port designated, pending protocol information.
    pub fn start(&self) {
        let mut inner = self.inner.lock();
        for (id, role) in inner.roles.iter_mut() {
            *role = PortRole::Designated;
            info!("Designated port: {}", id);
        }
        info!("New root: {} cost {}", self.own_id, inner.cost);
        self.assert_invariants(&inner);
    }

    /// Takes a consistent snapshot of the belief and all port roles.
    pub fn snapshot(&self) -> BridgeView {
        let inner = self.inner.lock();
        BridgeView {
            bridge_id: self.own_id.clone(),
            root: inner.root.clone(),
            cost: inner.cost,
            next_hop: inner.next_hop.clone(),
            root_port: inner.root_port,
            confirmed: inner.last_confirmed.is_some(),
            ports: inner
                .roles
                .iter()
                .map(|(&id, &role)| PortStatus { id, role })
                .collect(),
        }
    }

    /// Evaluates and applies one incoming BPDU in a single critical
    /// section, returning the comparator's verdict.
    ///
    /// Holding the lock across evaluate-and-apply is what linearizes
    /// concurrent arrivals: the net effect of any interleaving equals
    /// some sequential application of the decision procedure.
    pub fn apply_bpdu(&self, port: PortId, link_cost: PathCost, bpdu: &Bpdu) -> Verdict {
        let mut inner = self.inner.lock();
        let belief = Belief {
            own_id: &self.own_id,
            root: &inner.root,
            cost: inner.cost,
            next_hop: &inner.next_hop,
            root_port: inner.root_port,
        };
        let verdict = comparator::evaluate(&belief, port, link_cost, bpdu);

        match &verdict {
            Verdict::Superior(adoption) => self.adopt(&mut inner, port, adoption),
            Verdict::Confirmed => {
                inner.last_confirmed = Some(Instant::now());
                debug!("confirmed root {} via port {}", inner.root, port);
            }
            Verdict::RootPathDegraded => {
                info!(
                    "upstream {} degraded on port {}, reverting to self as root",
                    inner.next_hop, port
                );
                self.reset(&mut inner);
            }
            Verdict::Segment(role) => self.set_role(&mut inner, port, *role),
            Verdict::Ignored => {}
        }

        self.assert_invariants(&inner);
        verdict
    }

    /// Resets the belief to "self is root" if it has not been confirmed
    /// within `max_age`. Returns true if a reset happened.
    ///
    /// A bridge that already believes itself root has no upstream to
    /// age out.
    pub fn age_out_if_stale(&self, max_age: Duration) -> bool {
        let mut inner = self.inner.lock();
        if inner.root == self.own_id {
            return false;
        }
        let stale = match inner.last_confirmed {
            Some(at) => at.elapsed() > max_age,
            None => true,
        };
        if stale {
            info!(
                "no confirmation for root {} within {:?}, reverting to self as root",
                inner.root, max_age
            );
            self.reset(&mut inner);
            self.assert_invariants(&inner);
        }
        stale
    }

    /// Ports a BPDU may be sent out of: every port not blocked.
    pub fn forwarding_ports(&self) -> Vec<PortId> {
        let inner = self.inner.lock();
        inner
            .roles
            .iter()
            .filter(|(_, role)| role.is_forwarding())
            .map(|(&id, _)| id)
            .collect()
    }

    /// Builds the BPDU describing the current belief, to be announced
    /// out of a given port.
    pub fn announcement(&self, port: PortId) -> Bpdu {
        let inner = self.inner.lock();
        Bpdu {
            root: inner.root.clone(),
            cost: inner.cost,
            sender: self.own_id.clone(),
            port,
        }
    }

    fn adopt(&self, inner: &mut Inner, port: PortId, adoption: &Adoption) {
        if adoption.root != inner.root {
            info!("New root: {} cost {}", adoption.root, adoption.cost);
        }
        inner.root = adoption.root.clone();
        inner.cost = adoption.cost;
        inner.next_hop = adoption.next_hop.clone();
        inner.root_port = Some(adoption.root_port);
        inner.last_confirmed = Some(Instant::now());

        // The uplink moved: the new root port takes the Root role and
        // every other port reverts to Designated. Segment elections on
        // subsequent BPDUs re-block where a neighbor is closer.
        for (&id, role) in inner.roles.iter_mut() {
            let new_role = if id == port {
                PortRole::Root
            } else {
                PortRole::Designated
            };
            if *role != new_role {
                debug!("port {} role {} -> {}", id, role, new_role);
            }
            *role = new_role;
        }
        info!("Root port: {}", port);
    }

    fn reset(&self, inner: &mut Inner) {
        inner.root = self.own_id.clone();
        inner.cost = PathCost::ZERO;
        inner.next_hop = self.own_id.clone();
        inner.root_port = None;
        inner.last_confirmed = None;
        for (id, role) in inner.roles.iter_mut() {
            if *role != PortRole::Designated {
                info!("Designated port: {}", id);
            }
            *role = PortRole::Designated;
        }
        info!("New root: {} cost 0", self.own_id);
    }

    fn set_role(&self, inner: &mut Inner, port: PortId, role: PortRole) {
        if let Some(current) = inner.roles.get_mut(&port) {
            if *current != role {
                match role {
                    PortRole::Blocked => info!("Disabled port: {}", port),
                    PortRole::Designated => info!("Designated port: {}", port),
                    PortRole::Root => info!("Root port: {}", port),
                    PortRole::Unknown => {}
                }
                *current = role;
            }
        }
    }

    fn assert_invariants(&self, inner: &Inner) {
        if inner.root == self.own_id {
            debug_assert_eq!(inner.cost, PathCost::ZERO);
            debug_assert!(inner.root_port.is_none());
        }
        debug_assert!(
            inner
                .roles
                .values()
                .filter(|r| **r == PortRole::Root)
                .count()
                <= 1
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> BridgeId {
        s.parse().unwrap()
    }

    fn state(own: &str, ports: u16) -> BridgeState {
        let state = BridgeState::new(id(own), (0..ports).map(PortId::new));
        state.start();
        state
    }

    fn bpdu(root: &str, cost: u32, sender: &str) -> Bpdu {
        Bpdu {
            root: id(root),
            cost: PathCost::new(cost),
            sender: id(sender),
            port: PortId::new(0),
        }
    }

    const LINK: PathCost = PathCost::new(1);

    #[test]
    fn test_initial_state_is_unconfirmed_self_root() {
        let state = BridgeState::new(id("000b"), [PortId::new(0)]);
        let view = state.snapshot();
        assert!(view.is_root_bridge());
        assert_eq!(view.cost, PathCost::ZERO);
        assert_eq!(view.root_port, None);
        assert!(!view.confirmed);
        assert_eq!(view.role_of(PortId::new(0)), Some(PortRole::Unknown));
    }

    #[test]
    fn test_start_marks_ports_designated() {
        let state = state("000b", 3);
        let view = state.snapshot();
        assert!(view
            .ports
            .iter()
            .all(|p| p.role == PortRole::Designated));
    }

    #[test]
    fn test_adoption_updates_belief_and_roles_together() {
        let state = state("000b", 2);
        let verdict = state.apply_bpdu(PortId::new(0), LINK, &bpdu("000a", 0, "000a"));
        assert!(matches!(verdict, Verdict::Superior(_)));

        let view = state.snapshot();
        assert_eq!(view.root, id("000a"));
        assert_eq!(view.cost, PathCost::new(1));
        assert_eq!(view.next_hop, id("000a"));
        assert_eq!(view.root_port, Some(PortId::new(0)));
        assert!(view.confirmed);
        assert_eq!(view.role_of(PortId::new(0)), Some(PortRole::Root));
        assert_eq!(view.role_of(PortId::new(1)), Some(PortRole::Designated));
    }

    #[test]
    fn test_at_most_one_root_port() {
        let state = state("000d", 3);
        state.apply_bpdu(PortId::new(0), LINK, &bpdu("000a", 0, "000a"));
        state.apply_bpdu(PortId::new(1), LINK, &bpdu("000a", 0, "000a"));
        let view = state.snapshot();
        let roots = view
            .ports
            .iter()
            .filter(|p| p.role == PortRole::Root)
            .count();
        assert_eq!(roots, 1);
        // Port 0 keeps the uplink: full tie broken on receiving port ID.
        assert_eq!(view.role_of(PortId::new(0)), Some(PortRole::Root));
    }

    #[test]
    fn test_confirmation_is_idempotent() {
        let state = state("000b", 2);
        state.apply_bpdu(PortId::new(0), LINK, &bpdu("000a", 0, "000a"));
        let before = state.snapshot();

        for _ in 0..5 {
            let verdict = state.apply_bpdu(PortId::new(0), LINK, &bpdu("000a", 0, "000a"));
            assert_eq!(verdict, Verdict::Confirmed);
        }
        // Nothing but the (non-observable) timestamp may change.
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn test_segment_blocking_and_unblocking() {
        let state = state("000c", 2);
        state.apply_bpdu(PortId::new(0), LINK, &bpdu("000a", 0, "000a"));

        // A closer neighbor on port 1 blocks it.
        let verdict = state.apply_bpdu(PortId::new(1), LINK, &bpdu("000a", 1, "000b"));
        assert_eq!(verdict, Verdict::Segment(PortRole::Blocked));
        assert_eq!(
            state.snapshot().role_of(PortId::new(1)),
            Some(PortRole::Blocked)
        );

        // A worse advertisement re-designates it.
        let verdict = state.apply_bpdu(PortId::new(1), LINK, &bpdu("000a", 5, "000e"));
        assert_eq!(verdict, Verdict::Segment(PortRole::Designated));
        assert_eq!(
            state.snapshot().role_of(PortId::new(1)),
            Some(PortRole::Designated)
        );
    }

    #[test]
    fn test_degraded_upstream_resets_to_self_root() {
        let state = state("000b", 2);
        state.apply_bpdu(PortId::new(0), LINK, &bpdu("000a", 0, "000a"));

        let verdict = state.apply_bpdu(PortId::new(0), LINK, &bpdu("00ff", 0, "000a"));
        assert_eq!(verdict, Verdict::RootPathDegraded);

        let view = state.snapshot();
        assert!(view.is_root_bridge());
        assert_eq!(view.cost, PathCost::ZERO);
        assert_eq!(view.root_port, None);
        assert!(!view.confirmed);
        assert!(view.ports.iter().all(|p| p.role == PortRole::Designated));
    }

    #[test]
    fn test_aging_reset() {
        let state = state("000b", 2);
        state.apply_bpdu(PortId::new(0), LINK, &bpdu("000a", 0, "000a"));
        state.apply_bpdu(PortId::new(1), LINK, &bpdu("000a", 1, "0001"));
        assert_eq!(state.snapshot().blocked_count(), 1);

        // Freshly confirmed: a generous max age does not fire.
        assert!(!state.age_out_if_stale(Duration::from_secs(3600)));
        // Zero max age: everything is stale.
        assert!(state.age_out_if_stale(Duration::ZERO));

        let view = state.snapshot();
        assert!(view.is_root_bridge());
        assert!(view.ports.iter().all(|p| p.role == PortRole::Designated));
    }

    #[test]
    fn test_self_root_never_ages() {
        let state = state("000a", 2);
        assert!(!state.age_out_if_stale(Duration::ZERO));
        assert!(state.snapshot().is_root_bridge());
    }

    #[test]
    fn test_forwarding_ports_exclude_blocked() {
        let state = state("000c", 3);
        state.apply_bpdu(PortId::new(0), LINK, &bpdu("000a", 0, "000a"));
        state.apply_bpdu(PortId::new(1), LINK, &bpdu("000a", 1, "000b"));
        assert_eq!(
            state.forwarding_ports(),
            vec![PortId::new(0), PortId::new(2)]
        );
    }

    #[test]
    fn test_announcement_reflects_belief() {
        let state = state("000b", 1);
        state.apply_bpdu(PortId::new(0), LINK, &bpdu("000a", 2, "000c"));
        let bpdu = state.announcement(PortId::new(0));
        assert_eq!(bpdu.root, id("000a"));
        assert_eq!(bpdu.cost, PathCost::new(3));
        assert_eq!(bpdu.sender, id("000b"));
    }
}
