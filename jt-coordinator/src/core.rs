use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};
use tracing::{debug, info, warn};

use common::rpc::{
    self, AddTaskRequest, AddTaskResponse, GetJobIdRequest, GetJobIdResponse, HeartbeatRequest,
    HeartbeatResponse, JobSummary, JobsRequest, JobsResponse, ReportProgressRequest,
    ReportProgressResponse, StatusRequest, StatusResponse, SubmitJobRequest, SubmitJobResponse,
    UpdateJobStatusRequest, UpdateJobStatusResponse,
};
use common::{clock, JobDescriptor, TaskStatus};

pub use common::rpc::{Coordinator, CoordinatorServer};

use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::jobs::{Job, JobRegistry};
use crate::sweeper::{spawn_sweeper, LivenessSweeper, TaskTimeoutSweeper};
use crate::task_progress::TaskProgressTable;
use crate::worker_registry::WorkerRegistry;

/// The coordinator: job, task and worker tables behind the RPC surface.
///
/// Cloning is cheap; clones share the same tables.
#[derive(Debug, Clone)]
pub struct JobTracker {
    jobs: Arc<JobRegistry>,
    tasks: Arc<TaskProgressTable>,
    workers: Arc<WorkerRegistry>,
    config: TrackerConfig,
}

impl JobTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            jobs: Arc::new(JobRegistry::new()),
            tasks: Arc::new(TaskProgressTable::new()),
            workers: Arc::new(WorkerRegistry::new(config.liveness_cycle_ms())),
            config,
        }
    }

    pub fn job_registry(&self) -> &Arc<JobRegistry> {
        &self.jobs
    }

    pub fn task_table(&self) -> &Arc<TaskProgressTable> {
        &self.tasks
    }

    pub fn worker_registry(&self) -> &Arc<WorkerRegistry> {
        &self.workers
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Start the liveness and task-timeout sweepers. Both stop when
    /// `shutdown` is cancelled.
    pub fn spawn_sweepers(&self, shutdown: CancellationToken) -> Vec<JoinHandle<()>> {
        let cycle = self.config.liveness_cycle;
        vec![
            spawn_sweeper(LivenessSweeper::new(self.workers.clone()), cycle, shutdown.clone()),
            spawn_sweeper(
                TaskTimeoutSweeper::new(self.tasks.clone(), self.config.liveness_cycle_ms()),
                cycle,
                shutdown,
            ),
        ]
    }
}

fn summarize(job: &Job) -> JobSummary {
    JobSummary {
        job_id: job.get_id(),
        name: job.get_name().to_string(),
        status: rpc::JobStatus::from(job.get_status()) as i32,
        map_tasks: job.get_map_tasks().len() as u32,
        reduce_tasks: job.get_reduce_tasks().len() as u32,
        finished_maps: job.finished_maps() as u32,
        finished_reduces: job.finished_reduces() as u32,
        done: job.is_done(),
        block_count: job.get_input_blocks().len() as u32,
    }
}

#[tonic::async_trait]
impl Coordinator for JobTracker {
    async fn get_job_id(
        &self,
        _request: Request<GetJobIdRequest>,
    ) -> Result<Response<GetJobIdResponse>, Status> {
        let job_id = self.jobs.allocate_id();
        debug!(job_id, "Issued job id");
        Ok(Response::new(GetJobIdResponse { job_id }))
    }

    async fn submit_job(
        &self,
        request: Request<SubmitJobRequest>,
    ) -> Result<Response<SubmitJobResponse>, Status> {
        let descriptor = JobDescriptor::from(request.into_inner());
        let job = self.jobs.create_job(descriptor).await?;

        Ok(Response::new(SubmitJobResponse {
            job_id: job.get_id(),
            block_count: job.get_input_blocks().len() as u32,
        }))
    }

    async fn jobs(&self, _request: Request<JobsRequest>) -> Result<Response<JobsResponse>, Status> {
        let jobs = self.jobs.jobs().await.iter().map(summarize).collect();
        Ok(Response::new(JobsResponse { jobs }))
    }

    async fn status(&self, _request: Request<StatusRequest>) -> Result<Response<StatusResponse>, Status> {
        let workers = self
            .workers
            .workers()
            .await
            .into_iter()
            .map(|worker| worker.name)
            .collect();
        let counts = self.tasks.counts().await;

        Ok(Response::new(StatusResponse {
            workers,
            job_count: self.jobs.len().await as u32,
            init_tasks: counts.init as u32,
            running_tasks: counts.running as u32,
            succeeded_tasks: counts.succeeded as u32,
            failed_tasks: counts.failed as u32,
        }))
    }

    async fn heartbeat(
        &self,
        request: Request<HeartbeatRequest>,
    ) -> Result<Response<HeartbeatResponse>, Status> {
        let request = request.into_inner();
        if request.worker_name.is_empty() {
            return Err(TrackerError::InvalidArgument("worker name is empty".to_string()).into());
        }

        let now = clock::now_millis();
        if request.timestamp > 0 {
            debug!(
                worker = %request.worker_name,
                lag_ms = now.saturating_sub(request.timestamp),
                "Heartbeat received"
            );
        }
        self.workers.heartbeat(&request.worker_name, now).await;

        Ok(Response::new(HeartbeatResponse {}))
    }

    async fn report_progress(
        &self,
        request: Request<ReportProgressRequest>,
    ) -> Result<Response<ReportProgressResponse>, Status> {
        let request = request.into_inner();

        let status = if request.status == rpc::TaskStatus::Unspecified as i32 {
            None
        } else {
            let status = rpc::task_status_from_wire(request.status).ok_or_else(|| {
                TrackerError::InvalidArgument(format!("unknown task status {}", request.status))
            })?;
            Some(status)
        };

        let now = clock::now_millis();
        if request.timestamp > 0 {
            debug!(
                task_id = request.task_id,
                lag_ms = now.saturating_sub(request.timestamp),
                "Progress received"
            );
        }

        let progress = self
            .tasks
            .report_progress(request.task_id, request.percentage, now, status)
            .await?;

        if progress.status == TaskStatus::Succeed {
            if let Err(e) = self.jobs.report_finished_task(progress.job_id, progress.task_id).await {
                warn!(task_id = progress.task_id, error = %e, "Finished task has no job to report to");
            }
        }

        Ok(Response::new(ReportProgressResponse {}))
    }

    async fn add_task(&self, request: Request<AddTaskRequest>) -> Result<Response<AddTaskResponse>, Status> {
        let request = request.into_inner();
        let kind = rpc::task_kind_from_wire(request.kind)
            .ok_or_else(|| TrackerError::InvalidArgument(format!("unknown task kind {}", request.kind)))?;

        // The job learns the id before progress can be reported against it.
        let added = self.jobs.add_task(request.job_id, request.task_id, kind).await?;

        if let Err(e) = self.tasks.register(request.job_id, request.task_id, kind).await {
            if added {
                self.jobs.remove_task(request.job_id, request.task_id, kind).await;
            }
            return Err(e.into());
        }

        info!(job_id = request.job_id, task_id = request.task_id, %kind, "Task dispatched");
        Ok(Response::new(AddTaskResponse {}))
    }

    async fn update_job_status(
        &self,
        request: Request<UpdateJobStatusRequest>,
    ) -> Result<Response<UpdateJobStatusResponse>, Status> {
        let request = request.into_inner();
        let status = rpc::job_status_from_wire(request.status).ok_or_else(|| {
            TrackerError::InvalidArgument(format!("unknown job status {}", request.status))
        })?;

        self.jobs.set_status(request.job_id, status).await?;
        Ok(Response::new(UpdateJobStatusResponse {}))
    }
}
