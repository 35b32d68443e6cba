//! Spanning tree bridge daemon entry point.
//!
//! Attaches one bridge to its configured LAN segments and runs the
//! protocol until interrupted.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use stpd::{Bridge, BridgeConfig, UdpTransport};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// STP bridge daemon for simulated LAN topologies.
#[derive(Debug, Parser)]
#[command(name = "stpd", version, about)]
struct Args {
    /// Bridge ID (e.g., 02ab)
    #[arg(required_unless_present = "config")]
    bridge_id: Option<String>,

    /// UDP ports of the LAN segments to attach to, one per bridge port
    #[arg(required_unless_present = "config")]
    lan_ports: Vec<u16>,

    /// Load the bridge configuration from a TOML file instead
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => BridgeConfig::from_file(path)?,
        None => {
            let bridge_id = args
                .bridge_id
                .as_deref()
                .context("a bridge ID is required")?
                .parse()
                .context("invalid bridge ID")?;
            let config = BridgeConfig::from_lan_ports(bridge_id, &args.lan_ports);
            config.validate()?;
            config
        }
    };

    info!("Bridge starting up");
    let transport = Arc::new(UdpTransport::bind(&config.ports).await?);
    let mut bridge = Bridge::new(&config, transport)?;
    bridge.start();

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown signal received");
    bridge.shutdown().await;

    Ok(())
}
