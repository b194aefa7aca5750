/// What the coordinator knows about one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRecord {
    /// Name the worker heartbeats under.
    pub name: String,

    /// Time of the latest heartbeat, in milliseconds since the UNIX epoch.
    pub last_heartbeat: u64,
}

impl WorkerRecord {
    pub fn new(name: impl Into<String>, now: u64) -> Self {
        Self {
            name: name.into(),
            last_heartbeat: now,
        }
    }

    /// Record a heartbeat. Timestamps never move backwards.
    pub fn update_heartbeat(&mut self, now: u64) {
        self.last_heartbeat = self.last_heartbeat.max(now);
    }

    /// Alive while less than `threshold_ms` has passed since the last heartbeat.
    pub fn is_alive(&self, now: u64, threshold_ms: u64) -> bool {
        now.saturating_sub(self.last_heartbeat) < threshold_ms
    }
}
