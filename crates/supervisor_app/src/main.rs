//! # supervisor — simulation entity supervisor
//!
//! Lets NATS clients insert robots (from a robot description) or raw scene
//! fragments into a running simulation, remove them by name, and follow the
//! simulated clock.
//!
//! ## Startup Sequence
//!
//! 1. Parse and validate the command line.
//! 2. Create the scene host and the robot-description converter.
//! 3. Connect to NATS (`--nats-url`, else `NATS_URL`, else `nats://localhost:4222`).
//! 4. Serve commands and clock ticks on a single task until the simulation
//!    terminates or the process is interrupted.

mod bridge;
mod config;

use anyhow::{Result, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use supervisor_core::{CommandConverter, EntityManager, MemoryScene};
use supervisor_net::NatsConnection;

use bridge::Bridge;
use config::Args;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("supervisor=info".parse()?))
        .init();

    let args = Args::parse();
    if let Err(message) = args.validate() {
        bail!(message);
    }

    info!(
        timestep_ms = args.timestep,
        stop_after = ?args.stop_after,
        converter = %args.converter.display(),
        "supervisor starting"
    );

    let mut scene = MemoryScene::new(args.timestep);
    if let Some(seconds) = args.stop_after {
        scene = scene.with_stop_after(seconds);
    }
    let converter = CommandConverter::new(&args.converter).with_args(args.converter_args.clone());
    let manager = EntityManager::new(scene, converter);

    let config = args.bridge_config();
    let conn = match &args.nats_url {
        Some(url) => NatsConnection::connect_to(url, config.format).await?,
        None => NatsConnection::connect(config.format).await?,
    };

    let mut bridge = Bridge::new(manager, config);
    bridge.run(&conn).await?;

    info!("supervisor shut down");
    Ok(())
}
