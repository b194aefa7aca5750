use fnv::FnvHashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::worker_info::WorkerRecord;

/// Registry for workers, keyed by worker name.
#[derive(Debug)]
pub struct WorkerRegistry {
    workers: RwLock<FnvHashMap<String, WorkerRecord>>,

    /// A worker silent for this long is dead.
    liveness_threshold_ms: u64,
}

impl WorkerRegistry {
    pub fn new(liveness_threshold_ms: u64) -> Self {
        Self {
            workers: RwLock::new(FnvHashMap::default()),
            liveness_threshold_ms,
        }
    }

    pub fn liveness_threshold_ms(&self) -> u64 {
        self.liveness_threshold_ms
    }

    /// Record a heartbeat, registering the worker on first contact.
    ///
    /// Returns true if the worker was not known before.
    pub async fn heartbeat(&self, name: &str, now: u64) -> bool {
        let mut workers = self.workers.write().await;

        if let Some(worker) = workers.get_mut(name) {
            worker.update_heartbeat(now);
            debug!(worker = name, now, "Worker heartbeat");
            false
        } else {
            workers.insert(name.to_string(), WorkerRecord::new(name, now));
            info!(worker = name, "Worker registered");
            true
        }
    }

    /// Unknown workers are not alive.
    pub async fn is_alive(&self, name: &str, now: u64) -> bool {
        self.workers
            .read()
            .await
            .get(name)
            .is_some_and(|worker| worker.is_alive(now, self.liveness_threshold_ms))
    }

    pub async fn delete(&self, name: &str) -> Option<WorkerRecord> {
        let removed = self.workers.write().await.remove(name);
        if removed.is_some() {
            info!(worker = name, "Worker removed");
        }
        removed
    }

    /// Snapshot of the workers that are dead as of `now`.
    pub async fn stale_workers(&self, now: u64) -> Vec<WorkerRecord> {
        self.workers
            .read()
            .await
            .values()
            .filter(|worker| !worker.is_alive(now, self.liveness_threshold_ms))
            .cloned()
            .collect()
    }

    /// Remove a worker previously read as stale, unless it has heartbeated since.
    ///
    /// The record's `last_heartbeat` is the one observed at read time; any
    /// heartbeat in between changes the stored timestamp and keeps the worker.
    pub async fn delete_if_unchanged(&self, observed: &WorkerRecord) -> bool {
        let mut workers = self.workers.write().await;

        match workers.get(&observed.name) {
            Some(current) if current.last_heartbeat == observed.last_heartbeat => {
                workers.remove(&observed.name);
                true
            }
            _ => false,
        }
    }

    /// Snapshot of every worker, ordered by name.
    pub async fn workers(&self) -> Vec<WorkerRecord> {
        let mut workers: Vec<WorkerRecord> = self.workers.read().await.values().cloned().collect();
        workers.sort_by(|a, b| a.name.cmp(&b.name));
        workers
    }

    /// Number of registered workers, dead or alive.
    pub async fn len(&self) -> usize {
        self.workers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.workers.read().await.is_empty()
    }
}
