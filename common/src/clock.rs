use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock time in milliseconds since the UNIX epoch.
///
/// All heartbeat timestamps and staleness checks use this scale. A clock set
/// before the epoch reads as zero.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_current_time_in_millis() {
        let before = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_millis() as u64;
        let now = now_millis();
        let after = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_millis() as u64;

        assert!(before <= now && now <= after);
    }
}
