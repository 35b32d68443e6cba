//! Common types for the STP bridge daemon.
//!
//! This crate provides type-safe representations of the primitives used
//! throughout the spanning tree control plane:
//!
//! - [`BridgeId`]: totally ordered bridge identifiers
//! - [`PortId`]: stable per-bridge port indices
//! - [`PathCost`]: link and path costs for root-path comparisons
//! - [`PortRole`]: spanning tree port roles

mod bridge_id;
mod cost;
mod port;

pub use bridge_id::BridgeId;
pub use cost::PathCost;
pub use port::{PortId, PortRole};

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid bridge ID: {0} (expected 1-16 hex digits)")]
    InvalidBridgeId(String),

    #[error("invalid port role: {0}")]
    InvalidPortRole(String),
}
