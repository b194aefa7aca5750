use fnv::FnvHashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use common::{JobId, TaskId, TaskKind, TaskStatus};

use crate::error::{Result, TrackerError};

/// Progress of one dispatched task, as last reported by its worker.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskProgress {
    pub task_id: TaskId,

    /// Job the task was dispatched for.
    pub job_id: JobId,

    pub kind: TaskKind,

    /// In `[0, 100]`.
    pub percentage: f32,

    pub status: TaskStatus,

    /// Milliseconds since the UNIX epoch. Zero until the first report.
    pub last_heartbeat: u64,
}

impl TaskProgress {
    pub fn new(job_id: JobId, task_id: TaskId, kind: TaskKind) -> Self {
        Self {
            task_id,
            job_id,
            kind,
            percentage: 0.0,
            status: TaskStatus::Init,
            last_heartbeat: 0,
        }
    }

    /// No report for longer than `cycle_ms`.
    pub fn is_stale(&self, now: u64, cycle_ms: u64) -> bool {
        now.saturating_sub(self.last_heartbeat) > cycle_ms
    }
}

/// Number of tasks in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub init: usize,
    pub running: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Progress records of every dispatched task.
///
/// Single-record updates take the same write lock as the timeout sweep, so a
/// sweep always sees and leaves a consistent table.
#[derive(Debug, Default)]
pub struct TaskProgressTable {
    tasks: RwLock<FnvHashMap<TaskId, TaskProgress>>,
}

impl TaskProgressTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a dispatched task.
    ///
    /// A FAILED record under the same id is replaced, which is how a retry is
    /// dispatched. Any other existing record is a conflict.
    pub async fn register(&self, job_id: JobId, task_id: TaskId, kind: TaskKind) -> Result<TaskProgress> {
        let mut tasks = self.tasks.write().await;

        if let Some(existing) = tasks.get(&task_id) {
            if existing.status != TaskStatus::Failed {
                return Err(TrackerError::TaskConflict {
                    job_id: Some(existing.job_id),
                    task_id,
                });
            }
            debug!(task_id, job_id, "Re-registering failed task");
        }

        let progress = TaskProgress::new(job_id, task_id, kind);
        tasks.insert(task_id, progress.clone());
        Ok(progress)
    }

    /// Apply a progress report from a worker.
    ///
    /// `status` may move the task to SUCCEED or FAILED; anything else marks
    /// it RUNNING. Reports for finished tasks are rejected.
    pub async fn report_progress(
        &self,
        task_id: TaskId,
        percentage: f32,
        timestamp: u64,
        status: Option<TaskStatus>,
    ) -> Result<TaskProgress> {
        if !(0.0..=100.0).contains(&percentage) {
            return Err(TrackerError::InvalidProgress(percentage));
        }

        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(&task_id).ok_or(TrackerError::TaskNotFound(task_id))?;

        if task.status.is_terminal() {
            return Err(TrackerError::TaskFinished {
                task_id,
                status: task.status,
            });
        }

        task.percentage = percentage;
        task.last_heartbeat = task.last_heartbeat.max(timestamp);
        task.status = match status {
            Some(TaskStatus::Succeed) => TaskStatus::Succeed,
            Some(TaskStatus::Failed) => TaskStatus::Failed,
            _ => TaskStatus::Running,
        };

        match task.status {
            TaskStatus::Succeed => info!(task_id, job_id = task.job_id, "Task succeeded"),
            TaskStatus::Failed => warn!(task_id, job_id = task.job_id, "Task reported failure"),
            _ => debug!(task_id, percentage, "Task progress"),
        }

        Ok(task.clone())
    }

    pub async fn get(&self, task_id: TaskId) -> Option<TaskProgress> {
        self.tasks.read().await.get(&task_id).cloned()
    }

    pub async fn remove(&self, task_id: TaskId) -> Option<TaskProgress> {
        self.tasks.write().await.remove(&task_id)
    }

    /// Fail every unfinished task that has not reported for more than `cycle_ms`.
    ///
    /// Holds the write lock for the whole scan. SUCCEED tasks are never
    /// touched. Returns the ids that moved to FAILED.
    pub async fn fail_stale(&self, now: u64, cycle_ms: u64) -> Vec<TaskId> {
        let mut tasks = self.tasks.write().await;

        let mut failed = Vec::new();
        for task in tasks.values_mut() {
            if task.status.is_terminal() || !task.is_stale(now, cycle_ms) {
                continue;
            }
            task.status = TaskStatus::Failed;
            failed.push(task.task_id);
        }

        failed.sort_unstable();
        failed
    }

    pub async fn counts(&self) -> StatusCounts {
        let tasks = self.tasks.read().await;

        let mut counts = StatusCounts::default();
        for task in tasks.values() {
            match task.status {
                TaskStatus::Init => counts.init += 1,
                TaskStatus::Running => counts.running += 1,
                TaskStatus::Succeed => counts.succeeded += 1,
                TaskStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}
