//! Bridge orchestration: wires the registry, state, announcer and
//! receiver loops together and owns their lifecycle.

use crate::announcer;
use crate::config::BridgeConfig;
use crate::error::Result;
use crate::receiver;
use crate::registry::PortRegistry;
use crate::state::{BridgeState, BridgeView};
use crate::transport::Transport;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A running (or startable) STP bridge.
///
/// One announcer task plus one receiver task per port, all sharing a
/// single [`BridgeState`] and signaled to stop through one
/// cancellation token.
pub struct Bridge {
    state: Arc<BridgeState>,
    registry: Arc<PortRegistry>,
    transport: Arc<dyn Transport>,
    hello_interval: Duration,
    max_age: Duration,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Bridge {
    /// Builds a bridge from validated configuration and a transport.
    pub fn new(config: &BridgeConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let registry = Arc::new(PortRegistry::new(config.ports.clone()));
        let state = Arc::new(BridgeState::new(
            config.bridge_id.clone(),
            registry.ids(),
        ));
        Ok(Bridge {
            state,
            registry,
            transport,
            hello_interval: config.hello_interval(),
            max_age: config.max_age(),
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
        })
    }

    /// Starts the announcer and one receiver per port.
    ///
    /// Idempotent: calling `start` on a running bridge does nothing.
    pub fn start(&mut self) {
        if !self.tasks.is_empty() {
            return;
        }
        info!("bridge {} starting with {} ports", self.state.own_id(), self.registry.len());
        self.state.start();

        self.tasks.push(tokio::spawn(announcer::run(
            Arc::clone(&self.state),
            Arc::clone(&self.transport),
            self.hello_interval,
            self.max_age,
            self.cancel.clone(),
        )));

        for port in self.registry.ports() {
            self.tasks.push(tokio::spawn(receiver::run(
                port.id,
                port.cost,
                Arc::clone(&self.state),
                Arc::clone(&self.transport),
                self.cancel.clone(),
            )));
        }
    }

    /// This bridge's ID.
    pub fn bridge_id(&self) -> &stp_types::BridgeId {
        self.state.own_id()
    }

    /// A consistent snapshot of the belief and all port roles, for
    /// external tooling to verify convergence.
    pub fn status(&self) -> BridgeView {
        self.state.snapshot()
    }

    /// Signals every task to stop and waits for them to finish.
    ///
    /// No partial update is left visible: tasks only mutate state under
    /// the state lock, and cancellation lands between critical sections.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        info!("bridge {} stopped", self.state.own_id());
    }
}
