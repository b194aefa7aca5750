use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8030;
pub const DEFAULT_LIVENESS_CYCLE_MS: u64 = 8_000;

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub listen_addr: SocketAddr,

    /// Staleness threshold for both workers and tasks, and the delay between
    /// two cycles of each sweeper.
    pub liveness_cycle: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0, 0, 0, 0, 1], DEFAULT_PORT)),
            liveness_cycle: Duration::from_millis(DEFAULT_LIVENESS_CYCLE_MS),
        }
    }
}

impl TrackerConfig {
    pub fn new(listen_addr: SocketAddr, liveness_cycle: Duration) -> Self {
        Self {
            listen_addr,
            liveness_cycle,
        }
    }

    /// Liveness cycle in the millisecond scale used by heartbeat timestamps.
    pub fn liveness_cycle_ms(&self) -> u64 {
        self.liveness_cycle.as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_config_default() {
        let cfg = TrackerConfig::default();
        assert_eq!(cfg.listen_addr.to_string(), "[::1]:8030");
        assert_eq!(cfg.liveness_cycle, Duration::from_secs(8));
        assert_eq!(cfg.liveness_cycle_ms(), 8_000);
    }

    #[test]
    fn tracker_config_new() {
        let addr: SocketAddr = "10.0.0.1:9000".parse().unwrap();
        let cfg = TrackerConfig::new(addr, Duration::from_millis(250));
        assert_eq!(cfg.listen_addr, addr);
        assert_eq!(cfg.liveness_cycle_ms(), 250);
    }
}
