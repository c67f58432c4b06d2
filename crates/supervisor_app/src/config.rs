//! Command-line configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use supervisor_core::converter::DEFAULT_CONVERTER;
use supervisor_net::WireFormat;
use supervisor_net::subjects::DEFAULT_PREFIX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Wire {
    Msgpack,
    Json,
}

impl From<Wire> for WireFormat {
    fn from(wire: Wire) -> Self {
        match wire {
            Wire::Msgpack => WireFormat::MessagePack,
            Wire::Json => WireFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "supervisor",
    about = "Spawns and removes simulated entities on request and relays the simulation clock over NATS"
)]
pub struct Args {
    /// NATS server URL (defaults to the NATS_URL environment variable, then localhost)
    #[arg(short, long)]
    pub nats_url: Option<String>,

    /// NATS subject prefix
    #[arg(short, long, default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// Payload encoding
    #[arg(short, long, value_enum, default_value_t = Wire::Msgpack)]
    pub wire: Wire,

    /// Clock ticks per second
    #[arg(long, default_value_t = 1000.0)]
    pub tick_rate: f64,

    /// Basic time step of the simulated world, in milliseconds
    #[arg(long, default_value_t = 32)]
    pub timestep: u32,

    /// Terminate the simulation after this many seconds of simulated time
    #[arg(long)]
    pub stop_after: Option<f64>,

    /// Robot-description converter program
    #[arg(long, default_value = DEFAULT_CONVERTER)]
    pub converter: PathBuf,

    /// Argument passed to the converter before the conversion arguments (repeatable)
    #[arg(long = "converter-arg", allow_hyphen_values = true)]
    pub converter_args: Vec<String>,
}

/// Configuration of the bridge loop.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Subject prefix for commands and the clock.
    pub prefix: String,
    /// Payload encoding for requests and replies.
    pub format: WireFormat,
    /// Target clock ticks per second.
    pub tick_rate: f64,
}

impl BridgeConfig {
    /// Interval between clock ticks.
    #[must_use]
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            format: WireFormat::default(),
            tick_rate: 1000.0,
        }
    }
}

impl Args {
    /// Check value ranges clap cannot express.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid argument.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.tick_rate.is_finite() && self.tick_rate > 0.0) {
            return Err(format!("tick rate must be positive, got {}", self.tick_rate));
        }
        if self.timestep == 0 {
            return Err("time step must be at least 1 ms".to_string());
        }
        if self.prefix.is_empty() || self.prefix.contains(['*', '>', ' ']) {
            return Err(format!("invalid subject prefix: {:?}", self.prefix));
        }
        Ok(())
    }

    #[must_use]
    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            prefix: self.prefix.clone(),
            format: self.wire.into(),
            tick_rate: self.tick_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["supervisor"]);
        assert_eq!(args.nats_url, None);
        assert_eq!(args.prefix, "supervisor");
        assert_eq!(args.wire, Wire::Msgpack);
        assert_eq!(args.timestep, 32);
        assert_eq!(args.converter, PathBuf::from("urdf2webots"));
        assert!(args.validate().is_ok());

        let config = args.bridge_config();
        assert_eq!(config.format, WireFormat::MessagePack);
        assert_eq!(config.tick_period(), Duration::from_millis(1));
    }

    #[test]
    fn test_converter_args() {
        let args = Args::parse_from([
            "supervisor",
            "--converter",
            "python3",
            "--converter-arg",
            "-m",
            "--converter-arg",
            "urdf2webots.importer",
            "--wire",
            "json",
        ]);
        assert_eq!(args.converter_args, vec!["-m", "urdf2webots.importer"]);
        assert_eq!(args.bridge_config().format, WireFormat::Json);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let args = Args::parse_from(["supervisor", "--tick-rate", "0"]);
        assert!(args.validate().is_err());
        let args = Args::parse_from(["supervisor", "--timestep", "0"]);
        assert!(args.validate().is_err());
        let args = Args::parse_from(["supervisor", "--prefix", "sim.>"]);
        assert!(args.validate().is_err());
    }
}
