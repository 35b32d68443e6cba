//! Periodic BPDU announcement and aging.

use crate::state::BridgeState;
use crate::transport::Transport;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Sends the current belief out of every non-blocked port.
///
/// A send failure on one port is logged and skipped; the remaining
/// ports still get their announcement.
pub(crate) async fn announce_all(state: &BridgeState, transport: &dyn Transport) {
    for port in state.forwarding_ports() {
        let bpdu = state.announcement(port);
        let frame = bpdu.encode();
        if let Err(e) = transport.send(port, &frame).await {
            warn!("failed to announce on port {}: {}", port, e);
        }
    }
}

/// The announcer task: on every hello interval, re-announce the current
/// belief, then age out a root belief that has gone unconfirmed for
/// longer than `max_age`.
///
/// The aging timer is the daemon's only timeout mechanism; a bridge
/// whose upstream disappears recovers here by reverting to "self is
/// root" and re-converging from fresh BPDUs.
pub async fn run(
    state: Arc<BridgeState>,
    transport: Arc<dyn Transport>,
    hello_interval: Duration,
    max_age: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval(hello_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                announce_all(&state, transport.as_ref()).await;
                state.age_out_if_stale(max_age);
            }
        }
    }
    debug!("announcer for bridge {} stopped", state.own_id());
}
