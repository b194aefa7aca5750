use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::Parser;

use jt_coordinator::config::{TrackerConfig, DEFAULT_LIVENESS_CYCLE_MS, DEFAULT_PORT};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// The port for the server to run on.
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// The address to bind to.
    #[arg(long, default_value = "::1")]
    pub host: IpAddr,

    /// Worker liveness threshold, task timeout and sweep interval, in milliseconds.
    #[arg(short, long, default_value_t = DEFAULT_LIVENESS_CYCLE_MS)]
    pub liveness_cycle_ms: u64,
}

impl From<&Args> for TrackerConfig {
    fn from(args: &Args) -> Self {
        TrackerConfig::new(
            SocketAddr::new(args.host, args.port),
            Duration::from_millis(args.liveness_cycle_ms),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["jt-coordinator"]);
        let config = TrackerConfig::from(&args);
        assert_eq!(config.listen_addr.to_string(), "[::1]:8030");
        assert_eq!(config.liveness_cycle_ms(), 8_000);
    }

    #[test]
    fn overrides() {
        let args = Args::parse_from([
            "jt-coordinator",
            "--port",
            "9100",
            "--host",
            "127.0.0.1",
            "--liveness-cycle-ms",
            "500",
        ]);
        let config = TrackerConfig::from(&args);
        assert_eq!(config.listen_addr.to_string(), "127.0.0.1:9100");
        assert_eq!(config.liveness_cycle, Duration::from_millis(500));
    }
}
