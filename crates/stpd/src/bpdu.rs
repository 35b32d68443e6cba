//! BPDU messages and their JSON wire framing.
//!
//! Frames are JSON objects broadcast on a LAN segment. A BPDU frame
//! looks like:
//!
//! ```json
//! {"source": "02ab", "dest": "ffff", "msg_id": 0, "type": "bpdu",
//!  "message": {"id": "02ab", "root": "02ab", "cost": 0, "port": 1}}
//! ```
//!
//! Anything else on the wire is data-plane traffic, which this daemon
//! does not forward; the receiver ignores it.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use stp_types::{BridgeId, PathCost, PortId};

/// Broadcast destination used for BPDU frames.
const BROADCAST_DEST: &str = "ffff";

/// An immutable bridge protocol data unit.
///
/// Carries the sender's belief about the root: the root's ID, the
/// sender's cost to reach it, and the sender's own ID (the designated
/// bridge for the segment the frame was sent on).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bpdu {
    /// The root bridge, as believed by the sender.
    pub root: BridgeId,
    /// The sender's cost to the root.
    pub cost: PathCost,
    /// The sending bridge.
    pub sender: BridgeId,
    /// The sender's port the frame went out on.
    pub port: PortId,
}

/// A decoded wire frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A BPDU addressed to all bridges on the segment.
    Bpdu(Bpdu),
    /// Any other traffic; out of scope for the control plane.
    Data,
}

#[derive(Serialize, Deserialize)]
struct WireFrame {
    source: String,
    dest: String,
    msg_id: u32,
    #[serde(rename = "type")]
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<WireBpdu>,
}

#[derive(Serialize, Deserialize)]
struct WireBpdu {
    id: BridgeId,
    root: BridgeId,
    cost: u32,
    port: u16,
}

impl Bpdu {
    /// Encodes this BPDU as a broadcast wire frame.
    pub fn encode(&self) -> Vec<u8> {
        let frame = WireFrame {
            source: self.sender.to_string(),
            dest: BROADCAST_DEST.to_string(),
            msg_id: 0,
            kind: "bpdu".to_string(),
            message: Some(WireBpdu {
                id: self.sender.clone(),
                root: self.root.clone(),
                cost: self.cost.value(),
                port: self.port.index(),
            }),
        };
        // A struct of strings and integers always serializes.
        serde_json::to_vec(&frame).unwrap_or_default()
    }

    /// Decodes a wire frame.
    ///
    /// Returns [`Frame::Data`] for well-formed frames that are not
    /// BPDUs, and an error for anything undecodable. A decode error is
    /// recovered locally by dropping the frame; it never mutates bridge
    /// state.
    pub fn decode(bytes: &[u8]) -> Result<Frame> {
        let frame: WireFrame = serde_json::from_slice(bytes)?;
        if frame.kind != "bpdu" {
            return Ok(Frame::Data);
        }
        let message = frame.message.ok_or_else(|| {
            crate::error::StpdError::Decode("bpdu frame without message body".to_string())
        })?;
        Ok(Frame::Bpdu(Bpdu {
            root: message.root,
            cost: PathCost::new(message.cost),
            sender: message.id,
            port: PortId::new(message.port),
        }))
    }
}
