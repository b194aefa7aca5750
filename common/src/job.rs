use std::fmt;
use std::path::PathBuf;

/// Coordinator-assigned job identifier. Zero is never issued.
pub type JobId = u32;

/// Task identifier. The scheduler keeps these unique across map and reduce tasks.
pub type TaskId = u32;

/// Lifecycle of a job. Transitions are driven by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JobStatus {
    #[default]
    Init,
    InProgress,
    Failed,
    Succeed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Init => write!(f, "init"),
            JobStatus::InProgress => write!(f, "in-progress"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Succeed => write!(f, "succeed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Map,
    Reduce,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Map => write!(f, "map"),
            TaskKind::Reduce => write!(f, "reduce"),
        }
    }
}

/// Progress state of a single dispatched task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskStatus {
    #[default]
    Init,
    Running,
    Succeed,
    Failed,
}

impl TaskStatus {
    /// Terminal states accept no further progress reports.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Succeed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Init => write!(f, "init"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Succeed => write!(f, "succeed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Names of the user-supplied processing logic for a job.
///
/// These are opaque to the coordinator. Whatever executes tasks on the
/// workers resolves them; the coordinator only stores and hands them back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicHandles {
    pub mapper: String,
    pub reducer: String,
    pub partitioner: String,
    pub input_format: String,
    pub output_format: String,
}

/// Everything a client supplies when submitting a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    /// Id previously obtained from the coordinator, if any.
    pub job_id: Option<JobId>,

    pub name: String,

    pub logic: LogicHandles,

    /// A single file, or a directory whose direct children are the input files.
    pub input_path: PathBuf,

    pub output_path: PathBuf,

    /// Nominal input block size in bytes. Must be positive.
    pub block_size: i64,

    pub reducer_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_succeed_and_failed_are_terminal() {
        assert!(!TaskStatus::Init.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Succeed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
    }

    #[test]
    fn statuses_display_lowercase() {
        assert_eq!(JobStatus::InProgress.to_string(), "in-progress");
        assert_eq!(TaskStatus::Succeed.to_string(), "succeed");
        assert_eq!(TaskKind::Reduce.to_string(), "reduce");
    }
}
