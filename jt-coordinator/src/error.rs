use common::{JobId, SplitError, TaskId, TaskStatus};
use thiserror::Error;
use tonic::Status;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("invalid job configuration: {0}")]
    Configuration(#[from] SplitError),

    #[error("job not found: {0}")]
    JobNotFound(JobId),

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("task {task_id} is already registered{}", .job_id.map(|id| format!(" in job {id}")).unwrap_or_default())]
    TaskConflict {
        job_id: Option<JobId>,
        task_id: TaskId,
    },

    #[error("task {task_id} already finished with status {status}")]
    TaskFinished { task_id: TaskId, status: TaskStatus },

    #[error("progress must be within [0, 100], got {0}")]
    InvalidProgress(f32),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;

impl From<TrackerError> for Status {
    fn from(err: TrackerError) -> Self {
        let message = err.to_string();
        match err {
            TrackerError::Configuration(_)
            | TrackerError::InvalidProgress(_)
            | TrackerError::InvalidArgument(_) => Status::invalid_argument(message),
            TrackerError::JobNotFound(_) | TrackerError::TaskNotFound(_) => {
                Status::not_found(message)
            }
            TrackerError::TaskConflict { .. } => Status::already_exists(message),
            TrackerError::TaskFinished { .. } => Status::failed_precondition(message),
            TrackerError::Internal(_) => Status::internal(message),
        }
    }
}
