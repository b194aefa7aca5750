//! Periodic maintenance of the worker and task tables.
//!
//! Each sweeper runs on its own tokio task with a fixed delay between cycles:
//! a cycle runs to completion, then the task sleeps. Two cycles of the same
//! sweeper never overlap.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use common::{clock, TaskId};

use crate::task_progress::TaskProgressTable;
use crate::worker_info::WorkerRecord;
use crate::worker_registry::WorkerRegistry;

/// One periodic maintenance pass.
#[tonic::async_trait]
pub trait Sweep: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Run one cycle as of `now` (milliseconds since the UNIX epoch).
    /// Returns the number of records affected.
    async fn sweep(&self, now: u64) -> usize;
}

/// The two-step view of the worker table a liveness sweep works through.
#[tonic::async_trait]
pub trait WorkerTable: Send + Sync + 'static {
    async fn stale_workers(&self, now: u64) -> Vec<WorkerRecord>;

    async fn delete_if_unchanged(&self, observed: &WorkerRecord) -> bool;
}

#[tonic::async_trait]
impl WorkerTable for WorkerRegistry {
    async fn stale_workers(&self, now: u64) -> Vec<WorkerRecord> {
        WorkerRegistry::stale_workers(self, now).await
    }

    async fn delete_if_unchanged(&self, observed: &WorkerRecord) -> bool {
        WorkerRegistry::delete_if_unchanged(self, observed).await
    }
}

/// Evicts workers whose last heartbeat is older than the liveness threshold.
pub struct LivenessSweeper<W = WorkerRegistry> {
    workers: Arc<W>,
}

impl<W: WorkerTable> LivenessSweeper<W> {
    pub fn new(workers: Arc<W>) -> Self {
        Self { workers }
    }

    /// Remove every dead worker, returning the evicted names.
    ///
    /// Workers are read first and deleted one by one afterwards. A worker
    /// that heartbeats in between is kept.
    pub async fn evict_dead(&self, now: u64) -> Vec<String> {
        let stale = self.workers.stale_workers(now).await;

        let mut evicted = Vec::with_capacity(stale.len());
        for worker in stale {
            if self.workers.delete_if_unchanged(&worker).await {
                warn!(
                    worker = %worker.name,
                    silent_ms = now.saturating_sub(worker.last_heartbeat),
                    "Evicting dead worker"
                );
                evicted.push(worker.name);
            } else {
                debug!(worker = %worker.name, "Worker heartbeated during sweep, keeping it");
            }
        }
        evicted
    }
}

#[tonic::async_trait]
impl<W: WorkerTable> Sweep for LivenessSweeper<W> {
    fn name(&self) -> &'static str {
        "liveness"
    }

    async fn sweep(&self, now: u64) -> usize {
        self.evict_dead(now).await.len()
    }
}

/// Marks tasks FAILED once they stop reporting progress.
#[derive(Debug, Clone)]
pub struct TaskTimeoutSweeper {
    tasks: Arc<TaskProgressTable>,
    cycle_ms: u64,
}

impl TaskTimeoutSweeper {
    pub fn new(tasks: Arc<TaskProgressTable>, cycle_ms: u64) -> Self {
        Self { tasks, cycle_ms }
    }

    pub async fn fail_stalled(&self, now: u64) -> Vec<TaskId> {
        let failed = self.tasks.fail_stale(now, self.cycle_ms).await;
        for task_id in &failed {
            warn!(task_id, timeout_ms = self.cycle_ms, "Task timed out");
        }
        failed
    }
}

#[tonic::async_trait]
impl Sweep for TaskTimeoutSweeper {
    fn name(&self) -> &'static str {
        "task-timeout"
    }

    async fn sweep(&self, now: u64) -> usize {
        self.fail_stalled(now).await.len()
    }
}

/// Run `sweeper` every `delay` until `shutdown` is cancelled.
pub fn spawn_sweeper<S: Sweep>(sweeper: S, delay: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(sweeper = sweeper.name(), ?delay, "Sweeper started");

        loop {
            let affected = sweeper.sweep(clock::now_millis()).await;
            if affected > 0 {
                debug!(sweeper = sweeper.name(), affected, "Sweep cycle done");
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!(sweeper = sweeper.name(), "Sweeper stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{TaskKind, TaskStatus};
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[tokio::test]
    async fn liveness_sweep_removes_exactly_the_stale_worker() {
        let workers = Arc::new(WorkerRegistry::new(1_000));
        workers.heartbeat("stale", 0).await;
        workers.heartbeat("alive", 4_500).await;

        let sweeper = LivenessSweeper::new(workers.clone());
        assert_eq!(sweeper.evict_dead(5_000).await, vec!["stale".to_string()]);

        let names: Vec<String> = workers.workers().await.into_iter().map(|w| w.name).collect();
        assert_eq!(names, vec!["alive".to_string()]);
    }

    #[tokio::test]
    async fn liveness_sweep_with_nothing_stale_is_a_no_op() {
        let workers = Arc::new(WorkerRegistry::new(1_000));
        workers.heartbeat("tt-1", 900).await;

        let sweeper = LivenessSweeper::new(workers.clone());
        assert_eq!(sweeper.sweep(1_000).await, 0);
        assert_eq!(workers.len().await, 1);
    }

    #[tokio::test]
    async fn timeout_sweep_fails_stale_tasks_only() {
        let tasks = Arc::new(TaskProgressTable::new());
        tasks.register(1, 1, TaskKind::Map).await.unwrap();
        tasks.register(1, 2, TaskKind::Map).await.unwrap();
        tasks.register(1, 3, TaskKind::Reduce).await.unwrap();
        tasks
            .report_progress(1, 100.0, 0, Some(TaskStatus::Succeed))
            .await
            .unwrap();
        tasks.report_progress(2, 20.0, 100, None).await.unwrap();
        tasks.report_progress(3, 20.0, 9_000, None).await.unwrap();

        let sweeper = TaskTimeoutSweeper::new(tasks.clone(), 8_000);
        assert_eq!(sweeper.fail_stalled(10_000).await, vec![2]);

        assert_eq!(tasks.get(1).await.unwrap().status, TaskStatus::Succeed);
        assert_eq!(tasks.get(2).await.unwrap().status, TaskStatus::Failed);
        assert_eq!(tasks.get(3).await.unwrap().status, TaskStatus::Running);
    }

    /// Lets a heartbeat land right after the sweep has read the stale workers.
    struct HeartbeatDuringSweep {
        registry: WorkerRegistry,
        worker: &'static str,
        at: u64,
    }

    #[tonic::async_trait]
    impl WorkerTable for HeartbeatDuringSweep {
        async fn stale_workers(&self, now: u64) -> Vec<WorkerRecord> {
            let stale = self.registry.stale_workers(now).await;
            self.registry.heartbeat(self.worker, self.at).await;
            stale
        }

        async fn delete_if_unchanged(&self, observed: &WorkerRecord) -> bool {
            self.registry.delete_if_unchanged(observed).await
        }
    }

    #[tokio::test]
    async fn worker_heartbeating_during_sweep_survives() {
        let registry = WorkerRegistry::new(1_000);
        registry.heartbeat("racer", 0).await;
        registry.heartbeat("gone", 0).await;

        let table = Arc::new(HeartbeatDuringSweep {
            registry,
            worker: "racer",
            at: 2_000,
        });
        let sweeper = LivenessSweeper::new(table.clone());

        assert_eq!(sweeper.evict_dead(2_000).await, vec!["gone".to_string()]);
        assert!(table.registry.is_alive("racer", 2_000).await);
        assert_eq!(table.registry.len().await, 1);

        // Next cycle, through the runner's entry point: the racer is fresh.
        assert_eq!(sweeper.sweep(2_500).await, 0);
        assert!(table.registry.is_alive("racer", 2_500).await);
    }

    /// Records when each cycle starts and how many cycles run at once.
    struct SlowSweep {
        work: Duration,
        starts: Arc<Mutex<Vec<Instant>>>,
        active: Arc<Mutex<(usize, usize)>>,
    }

    #[tonic::async_trait]
    impl Sweep for SlowSweep {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn sweep(&self, _now: u64) -> usize {
            self.starts.lock().unwrap().push(Instant::now());
            {
                let mut active = self.active.lock().unwrap();
                active.0 += 1;
                active.1 = active.1.max(active.0);
            }
            tokio::time::sleep(self.work).await;
            self.active.lock().unwrap().0 -= 1;
            0
        }
    }

    #[tokio::test(start_paused = true)]
    async fn runner_waits_for_a_cycle_before_starting_the_next() {
        let starts = Arc::new(Mutex::new(Vec::new()));
        let active = Arc::new(Mutex::new((0, 0)));
        let sweeper = SlowSweep {
            work: Duration::from_millis(300),
            starts: starts.clone(),
            active: active.clone(),
        };

        let shutdown = CancellationToken::new();
        let handle = spawn_sweeper(sweeper, Duration::from_millis(100), shutdown.clone());

        tokio::time::sleep(Duration::from_millis(2_000)).await;
        shutdown.cancel();
        handle.await.unwrap();

        let starts = starts.lock().unwrap();
        assert!(starts.len() >= 3);
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(400));
        }
        assert_eq!(active.lock().unwrap().1, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn runner_stops_on_shutdown() {
        let workers = Arc::new(WorkerRegistry::new(1_000));
        let shutdown = CancellationToken::new();
        let handle = spawn_sweeper(
            LivenessSweeper::new(workers),
            Duration::from_secs(60),
            shutdown.clone(),
        );

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
