//! Per-port receiver loop.

use crate::announcer;
use crate::bpdu::{Bpdu, Frame};
use crate::comparator::Verdict;
use crate::state::BridgeState;
use crate::transport::Transport;
use std::sync::Arc;
use std::time::Duration;
use stp_types::{PathCost, PortId};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Back-off after a transport receive failure, so a faulty port cannot
/// spin the loop.
const RECV_RETRY_DELAY: Duration = Duration::from_millis(100);

/// The receiver task for one port: wait for the next inbound frame,
/// decode it, and feed it to the comparator under the state lock.
///
/// A malformed frame is dropped with a log line and nothing else; one
/// bad packet never destabilizes the bridge. A transport failure marks
/// the port temporarily silent and the loop keeps going; the other
/// ports are unaffected.
pub async fn run(
    port: PortId,
    link_cost: PathCost,
    state: Arc<BridgeState>,
    transport: Arc<dyn Transport>,
    cancel: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            frame = transport.recv(port) => frame,
        };

        let bytes = match frame {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("receive failed on port {}: {}", port, e);
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(RECV_RETRY_DELAY) => continue,
                }
            }
        };

        let bpdu = match Bpdu::decode(&bytes) {
            Ok(Frame::Bpdu(bpdu)) => bpdu,
            Ok(Frame::Data) => {
                debug!("ignoring data frame on port {}", port);
                continue;
            }
            Err(e) => {
                warn!("dropping malformed frame on port {}: {}", port, e);
                continue;
            }
        };

        let verdict = state.apply_bpdu(port, link_cost, &bpdu);
        if matches!(verdict, Verdict::Superior(_)) {
            // A better root path was adopted; tell the neighbors now
            // rather than waiting out the hello interval.
            announcer::announce_all(&state, transport.as_ref()).await;
        }
    }
    debug!("receiver for port {} stopped", port);
}
