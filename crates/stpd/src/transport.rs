//! Transport collaborators: how raw BPDU bytes reach a LAN segment.
//!
//! The daemon only depends on the [`Transport`] trait. [`UdpTransport`]
//! is the production implementation (one UDP socket per port, LANs are
//! UDP broadcast hubs on localhost); [`HubNetwork`] provides in-memory
//! LANs for tests and multi-bridge simulation in one process.

use crate::config::PortConfig;
use crate::error::{Result, StpdError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use stp_types::PortId;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

/// Maximum frame size accepted on receive.
const MAX_FRAME: usize = 1500;

/// Sends and receives raw frames on a bridge port.
///
/// `recv` blocks until the next inbound frame on that port; each port
/// has exactly one consumer (its receiver loop), so implementations may
/// assume `recv` is never called concurrently for the same port.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sends a frame out of a port, onto its LAN segment.
    async fn send(&self, port: PortId, frame: &[u8]) -> Result<()>;

    /// Waits for the next inbound frame on a port.
    async fn recv(&self, port: PortId) -> Result<Vec<u8>>;
}

/// UDP transport: each port owns a socket bound to an ephemeral
/// localhost address and talks to its LAN's UDP hub port.
pub struct UdpTransport {
    endpoints: Vec<UdpEndpoint>,
}

struct UdpEndpoint {
    id: PortId,
    lan: u16,
    socket: UdpSocket,
}

impl UdpTransport {
    /// Binds one socket per configured port.
    pub async fn bind(ports: &[PortConfig]) -> Result<Self> {
        let mut endpoints = Vec::with_capacity(ports.len());
        for port in ports {
            let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await?;
            endpoints.push(UdpEndpoint {
                id: port.id,
                lan: port.lan,
                socket,
            });
        }
        Ok(UdpTransport { endpoints })
    }

    fn endpoint(&self, port: PortId) -> Result<&UdpEndpoint> {
        self.endpoints
            .iter()
            .find(|e| e.id == port)
            .ok_or(StpdError::UnknownPort(port))
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send(&self, port: PortId, frame: &[u8]) -> Result<()> {
        let endpoint = self.endpoint(port)?;
        endpoint
            .socket
            .send_to(frame, (Ipv4Addr::LOCALHOST, endpoint.lan))
            .await
            .map_err(|e| StpdError::transport(port, e.to_string()))?;
        Ok(())
    }

    async fn recv(&self, port: PortId) -> Result<Vec<u8>> {
        let endpoint = self.endpoint(port)?;
        let mut buf = vec![0u8; MAX_FRAME];
        let (n, _addr) = endpoint
            .socket
            .recv_from(&mut buf)
            .await
            .map_err(|e| StpdError::transport(port, e.to_string()))?;
        buf.truncate(n);
        Ok(buf)
    }
}

type Subscriber = (usize, mpsc::UnboundedSender<Vec<u8>>);

/// An in-memory network of broadcast LAN segments.
///
/// Every endpoint attached to a LAN receives every frame sent on it,
/// except the sender's own. Used by tests to wire several bridges
/// together in one process.
#[derive(Default)]
pub struct HubNetwork {
    lans: Mutex<HashMap<u16, Vec<Subscriber>>>,
    next_token: AtomicUsize,
}

impl HubNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(HubNetwork::default())
    }

    /// Attaches a bridge's ports to their LANs and returns its transport.
    pub fn attach(self: &Arc<Self>, ports: &[PortConfig]) -> HubTransport {
        let endpoints = ports
            .iter()
            .map(|port| {
                let (token, rx) = self.subscribe(port.lan);
                HubEndpoint {
                    id: port.id,
                    lan: port.lan,
                    token,
                    rx: tokio::sync::Mutex::new(rx),
                }
            })
            .collect();
        HubTransport {
            net: Arc::clone(self),
            endpoints,
        }
    }

    /// Attaches a bare test endpoint to a LAN, for injecting frames and
    /// observing traffic without running a bridge.
    pub fn tap(self: &Arc<Self>, lan: u16) -> HubTap {
        let (token, rx) = self.subscribe(lan);
        HubTap {
            net: Arc::clone(self),
            lan,
            token,
            rx,
        }
    }

    fn subscribe(&self, lan: u16) -> (usize, mpsc::UnboundedReceiver<Vec<u8>>) {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.lans.lock().entry(lan).or_default().push((token, tx));
        (token, rx)
    }

    fn broadcast(&self, lan: u16, from: usize, frame: &[u8]) {
        let mut lans = self.lans.lock();
        if let Some(subscribers) = lans.get_mut(&lan) {
            // Prune endpoints whose receiver is gone.
            subscribers.retain(|(token, tx)| {
                if *token == from {
                    return true;
                }
                tx.send(frame.to_vec()).is_ok()
            });
        }
    }
}

struct HubEndpoint {
    id: PortId,
    lan: u16,
    token: usize,
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

/// Transport over an in-memory [`HubNetwork`].
pub struct HubTransport {
    net: Arc<HubNetwork>,
    endpoints: Vec<HubEndpoint>,
}

impl HubTransport {
    fn endpoint(&self, port: PortId) -> Result<&HubEndpoint> {
        self.endpoints
            .iter()
            .find(|e| e.id == port)
            .ok_or(StpdError::UnknownPort(port))
    }
}

#[async_trait]
impl Transport for HubTransport {
    async fn send(&self, port: PortId, frame: &[u8]) -> Result<()> {
        let endpoint = self.endpoint(port)?;
        self.net.broadcast(endpoint.lan, endpoint.token, frame);
        Ok(())
    }

    async fn recv(&self, port: PortId) -> Result<Vec<u8>> {
        let endpoint = self.endpoint(port)?;
        let mut rx = endpoint.rx.lock().await;
        rx.recv()
            .await
            .ok_or_else(|| StpdError::transport(port, "hub detached".to_string()))
    }
}

/// A bare LAN endpoint for tests.
pub struct HubTap {
    net: Arc<HubNetwork>,
    lan: u16,
    token: usize,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl HubTap {
    /// Injects a frame onto the LAN.
    pub fn send(&self, frame: &[u8]) {
        self.net.broadcast(self.lan, self.token, frame);
    }

    /// Waits for the next frame seen on the LAN.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }
}
