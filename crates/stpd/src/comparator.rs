//! Pure BPDU decision logic.
//!
//! Given the bridge's current belief and an incoming BPDU, decides what
//! should happen: adopt a better root path, refresh the confirmation,
//! age out a degraded upstream, or re-elect the receiving port's role
//! on its segment. The tie-break policy lives entirely in
//! [`PathVector`]'s ordering so it can be corrected in one place.

use crate::bpdu::Bpdu;
use std::cmp::Ordering;
use stp_types::{BridgeId, PathCost, PortId, PortRole};

/// A candidate path to the root, ordered by the spanning tree total
/// order: root ID, then cost, then the advertising bridge, then the
/// receiving port. Lower is better.
///
/// A `port` of `None` stands for "no port" (a bridge that is its own
/// root) and orders after every concrete port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathVector {
    pub root: BridgeId,
    pub cost: PathCost,
    pub bridge: BridgeId,
    pub port: Option<PortId>,
}

impl Ord for PathVector {
    fn cmp(&self, other: &Self) -> Ordering {
        self.root
            .cmp(&other.root)
            .then_with(|| self.cost.cmp(&other.cost))
            .then_with(|| self.bridge.cmp(&other.bridge))
            .then_with(|| match (self.port, other.port) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    }
}

impl PartialOrd for PathVector {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The bridge's current belief, as seen inside the state lock.
#[derive(Debug, Clone, Copy)]
pub struct Belief<'a> {
    pub own_id: &'a BridgeId,
    pub root: &'a BridgeId,
    pub cost: PathCost,
    pub next_hop: &'a BridgeId,
    pub root_port: Option<PortId>,
}

impl Belief<'_> {
    /// The path vector this belief rests on.
    fn vector(&self) -> PathVector {
        PathVector {
            root: self.root.clone(),
            cost: self.cost,
            bridge: self.next_hop.clone(),
            port: self.root_port,
        }
    }
}

/// The new belief adopted from a superior BPDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adoption {
    pub root: BridgeId,
    pub cost: PathCost,
    pub next_hop: BridgeId,
    pub root_port: PortId,
}

/// The comparator's decision for one incoming BPDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The BPDU is superior to the current belief; adopt it.
    Superior(Adoption),
    /// The BPDU restates the current belief on the root port; refresh
    /// the confirmation timestamp only.
    Confirmed,
    /// The current upstream has regressed; the belief must be aged out
    /// immediately.
    RootPathDegraded,
    /// Segment election outcome for the receiving port: either this
    /// bridge forwards there (`Designated`) or a neighbor closer to the
    /// root does (`Blocked`).
    Segment(PortRole),
    /// No effect on bridge state.
    Ignored,
}

/// Evaluates one incoming BPDU against the current belief.
///
/// `port` is the receiving port and `link_cost` its configured cost.
/// Pure: reads nothing but its arguments, mutates nothing. The caller
/// applies the verdict under the same lock the belief was read under.
pub fn evaluate(belief: &Belief<'_>, port: PortId, link_cost: PathCost, bpdu: &Bpdu) -> Verdict {
    let candidate = PathVector {
        root: bpdu.root.clone(),
        cost: bpdu.cost.plus(link_cost),
        bridge: bpdu.sender.clone(),
        port: Some(port),
    };
    let current = belief.vector();

    if candidate < current {
        return Verdict::Superior(Adoption {
            root: candidate.root,
            cost: candidate.cost,
            next_hop: candidate.bridge,
            root_port: port,
        });
    }

    if belief.root_port == Some(port) {
        // Traffic on the uplink segment. Only the next hop speaks for
        // the path this belief rests on; other bridges sharing the LAN
        // say nothing about it.
        if bpdu.sender != *belief.next_hop {
            return Verdict::Ignored;
        }
        if bpdu.root == *belief.root && candidate.cost == belief.cost {
            return Verdict::Confirmed;
        }
        return Verdict::RootPathDegraded;
    }

    if bpdu.root == *belief.root {
        // Same root, non-uplink port: designated-bridge election for the
        // segment. The advertisement closer to the root (lower cost,
        // then lower bridge ID) wins; if the neighbor wins, forwarding
        // there would close a loop.
        let neighbor_wins = (bpdu.cost, &bpdu.sender) < (belief.cost, belief.own_id);
        if neighbor_wins {
            return Verdict::Segment(PortRole::Blocked);
        }
        return Verdict::Segment(PortRole::Designated);
    }

    // The sender believes in a worse root; this bridge is upstream of it.
    Verdict::Segment(PortRole::Designated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> BridgeId {
        s.parse().unwrap()
    }

    fn bpdu(root: &str, cost: u32, sender: &str) -> Bpdu {
        Bpdu {
            root: id(root),
            cost: PathCost::new(cost),
            sender: id(sender),
            port: PortId::new(0),
        }
    }

    fn vector(root: &str, cost: u32, bridge: &str, port: Option<u16>) -> PathVector {
        PathVector {
            root: id(root),
            cost: PathCost::new(cost),
            bridge: id(bridge),
            port: port.map(PortId::new),
        }
    }

    /// Belief of a bridge that thinks it is root.
    struct SelfRoot {
        own: BridgeId,
    }

    impl SelfRoot {
        fn belief(&self) -> Belief<'_> {
            Belief {
                own_id: &self.own,
                root: &self.own,
                cost: PathCost::ZERO,
                next_hop: &self.own,
                root_port: None,
            }
        }
    }

    /// Belief of a subordinate bridge.
    struct Subordinate {
        own: BridgeId,
        root: BridgeId,
        cost: PathCost,
        next_hop: BridgeId,
        root_port: PortId,
    }

    impl Subordinate {
        fn new(own: &str, root: &str, cost: u32, next_hop: &str, root_port: u16) -> Self {
            Subordinate {
                own: id(own),
                root: id(root),
                cost: PathCost::new(cost),
                next_hop: id(next_hop),
                root_port: PortId::new(root_port),
            }
        }

        fn belief(&self) -> Belief<'_> {
            Belief {
                own_id: &self.own,
                root: &self.root,
                cost: self.cost,
                next_hop: &self.next_hop,
                root_port: Some(self.root_port),
            }
        }
    }

    #[test]
    fn test_order_is_total_and_irreflexive() {
        let vectors = [
            vector("000a", 0, "000a", None),
            vector("000a", 1, "000b", Some(0)),
            vector("000a", 1, "000b", Some(1)),
            vector("000a", 1, "000c", Some(0)),
            vector("000a", 2, "000b", Some(0)),
            vector("000b", 0, "000b", None),
        ];
        // Exactly one of a < b, b < a holds for distinct keys, and the
        // list above is in strictly ascending order.
        for (i, a) in vectors.iter().enumerate() {
            assert_eq!(a.cmp(a), Ordering::Equal);
            for b in &vectors[i + 1..] {
                assert!(a < b);
                assert!(b > a);
            }
        }
    }

    #[test]
    fn test_order_is_transitive() {
        let a = vector("000a", 1, "000b", Some(0));
        let b = vector("000a", 1, "000c", Some(3));
        let c = vector("000b", 0, "000b", None);
        assert!(a < b && b < c && a < c);
    }

    #[test]
    fn test_lower_root_is_superior() {
        let state = SelfRoot { own: id("000b") };
        let verdict = evaluate(
            &state.belief(),
            PortId::new(0),
            PathCost::new(1),
            &bpdu("000a", 0, "000a"),
        );
        assert_eq!(
            verdict,
            Verdict::Superior(Adoption {
                root: id("000a"),
                cost: PathCost::new(1),
                next_hop: id("000a"),
                root_port: PortId::new(0),
            })
        );
    }

    #[test]
    fn test_higher_root_claim_makes_port_designated() {
        let state = SelfRoot { own: id("000b") };
        let verdict = evaluate(
            &state.belief(),
            PortId::new(1),
            PathCost::new(1),
            &bpdu("000c", 0, "000c"),
        );
        assert_eq!(verdict, Verdict::Segment(PortRole::Designated));
    }

    #[test]
    fn test_lower_cost_same_root_is_superior() {
        let state = Subordinate::new("000d", "000a", 5, "000b", 0);
        let verdict = evaluate(
            &state.belief(),
            PortId::new(1),
            PathCost::new(1),
            &bpdu("000a", 2, "000c"),
        );
        match verdict {
            Verdict::Superior(adoption) => {
                assert_eq!(adoption.cost, PathCost::new(3));
                assert_eq!(adoption.next_hop, id("000c"));
                assert_eq!(adoption.root_port, PortId::new(1));
            }
            other => panic!("expected superior, got {other:?}"),
        }
    }

    #[test]
    fn test_sender_id_breaks_cost_tie() {
        // Same root, same resulting cost: the lower sender wins the
        // next-hop slot no matter which advertisement came first.
        let adopted_d = Subordinate::new("000b", "000a", 2, "000d", 2);
        let from_c = bpdu("000a", 1, "000c");
        let verdict = evaluate(&adopted_d.belief(), PortId::new(1), PathCost::new(1), &from_c);
        assert!(matches!(verdict, Verdict::Superior(a) if a.next_hop == id("000c")));

        let adopted_c = Subordinate::new("000b", "000a", 2, "000c", 1);
        let from_d = bpdu("000a", 1, "000d");
        let verdict = evaluate(&adopted_c.belief(), PortId::new(2), PathCost::new(1), &from_d);
        // Not superior; D's segment advertisement beats what this bridge
        // would send there, so the port blocks.
        assert_eq!(verdict, Verdict::Segment(PortRole::Blocked));
    }

    #[test]
    fn test_port_id_breaks_full_tie() {
        // Two parallel links to the same upstream: the lower receiving
        // port wins.
        let state = Subordinate::new("000b", "000a", 1, "000a", 2);
        let verdict = evaluate(
            &state.belief(),
            PortId::new(1),
            PathCost::new(1),
            &bpdu("000a", 0, "000a"),
        );
        assert!(matches!(verdict, Verdict::Superior(a) if a.root_port == PortId::new(1)));
    }

    #[test]
    fn test_confirmation_on_root_port() {
        let state = Subordinate::new("000b", "000a", 1, "000a", 0);
        let verdict = evaluate(
            &state.belief(),
            PortId::new(0),
            PathCost::new(1),
            &bpdu("000a", 0, "000a"),
        );
        assert_eq!(verdict, Verdict::Confirmed);
    }

    #[test]
    fn test_degraded_upstream_on_root_port() {
        let state = Subordinate::new("000b", "000a", 1, "000a", 0);
        // The upstream now claims a worse root: the path is gone.
        let verdict = evaluate(
            &state.belief(),
            PortId::new(0),
            PathCost::new(1),
            &bpdu("000c", 0, "000a"),
        );
        assert_eq!(verdict, Verdict::RootPathDegraded);
    }

    #[test]
    fn test_third_bridge_on_root_lan_is_ignored() {
        let state = Subordinate::new("000b", "000a", 1, "000a", 0);
        // A sibling on the root LAN advertises the same root at a worse
        // cost; says nothing about our upstream.
        let verdict = evaluate(
            &state.belief(),
            PortId::new(0),
            PathCost::new(1),
            &bpdu("000a", 1, "000c"),
        );
        assert_eq!(verdict, Verdict::Ignored);
    }

    #[test]
    fn test_closer_neighbor_blocks_segment_port() {
        // B is at cost 1; C also at cost 1 but with the lower ID "000a"
        // as root. On the shared B-C segment, (1, "000b") < (1, "000c"),
        // so B stays designated and C blocks. Seen from C:
        let state = Subordinate::new("000c", "000a", 1, "000a", 0);
        let verdict = evaluate(
            &state.belief(),
            PortId::new(1),
            PathCost::new(1),
            &bpdu("000a", 1, "000b"),
        );
        assert_eq!(verdict, Verdict::Segment(PortRole::Blocked));

        // And from B, C's advertisement loses: the port stays designated.
        let state = Subordinate::new("000b", "000a", 1, "000a", 0);
        let verdict = evaluate(
            &state.belief(),
            PortId::new(1),
            PathCost::new(1),
            &bpdu("000a", 1, "000c"),
        );
        assert_eq!(verdict, Verdict::Segment(PortRole::Designated));
    }

    #[test]
    fn test_downstream_echo_is_designated() {
        // A bridge that adopted us echoes our root at a higher cost.
        let state = SelfRoot { own: id("000a") };
        let verdict = evaluate(
            &state.belief(),
            PortId::new(0),
            PathCost::new(1),
            &bpdu("000a", 1, "000b"),
        );
        assert_eq!(verdict, Verdict::Segment(PortRole::Designated));
    }
}
