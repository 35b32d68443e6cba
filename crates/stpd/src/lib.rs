//! Spanning Tree Protocol bridge daemon.
//!
//! Simulates one network bridge participating in classic STP: it
//! exchanges BPDUs with neighboring bridges over a fixed set of ports,
//! elects a root bridge, computes least-cost paths to the root, and
//! converges each port to a stable role (root, designated or blocked)
//! so the active topology is loop-free.
//!
//! The concurrency model is one receiver task per port plus one
//! periodic announcer task, all serialized through a single
//! lock-guarded [`state::BridgeState`].

pub mod announcer;
pub mod bpdu;
pub mod bridge;
pub mod comparator;
pub mod config;
pub mod error;
pub mod receiver;
pub mod registry;
pub mod state;
pub mod transport;

pub use bpdu::{Bpdu, Frame};
pub use bridge::Bridge;
pub use comparator::{Adoption, Belief, PathVector, Verdict};
pub use config::{BridgeConfig, PortConfig};
pub use error::{Result, StpdError};
pub use registry::PortRegistry;
pub use state::{BridgeState, BridgeView, PortStatus};
pub use transport::{HubNetwork, HubTap, HubTransport, Transport, UdpTransport};
