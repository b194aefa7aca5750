//! Wire contract between the coordinator and its clients (job submitters,
//! the scheduler, and workers).
//!
//! Messages are prost structs declared here; the `Coordinator` client and
//! server stubs are generated by `build.rs` into `coordinator_client` and
//! `coordinator_server`.
//!
//! NOTE: tags are part of the wire format. Append new fields, never renumber.

use std::path::PathBuf;

use crate::job::{self, JobDescriptor, LogicHandles};

include!(concat!(env!("OUT_DIR"), "/coordinator.Coordinator.rs"));

pub use coordinator_client::CoordinatorClient;
pub use coordinator_server::{Coordinator, CoordinatorServer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum JobStatus {
    Unspecified = 0,
    Init = 1,
    InProgress = 2,
    Failed = 3,
    Succeed = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TaskKind {
    Unspecified = 0,
    Map = 1,
    Reduce = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TaskStatus {
    Unspecified = 0,
    Init = 1,
    Running = 2,
    Succeed = 3,
    Failed = 4,
}

/////////////////////////////////////////////////////////////////////////////
// Job submission
/////////////////////////////////////////////////////////////////////////////

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetJobIdRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetJobIdResponse {
    #[prost(uint32, tag = "1")]
    pub job_id: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SubmitJobRequest {
    /// Id from `GetJobId`. Zero asks the coordinator to pick one.
    #[prost(uint32, tag = "1")]
    pub job_id: u32,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub mapper: String,
    #[prost(string, tag = "4")]
    pub reducer: String,
    #[prost(string, tag = "5")]
    pub partitioner: String,
    #[prost(string, tag = "6")]
    pub input_format: String,
    #[prost(string, tag = "7")]
    pub output_format: String,
    #[prost(string, tag = "8")]
    pub input_path: String,
    #[prost(string, tag = "9")]
    pub output_path: String,
    #[prost(int64, tag = "10")]
    pub block_size: i64,
    #[prost(uint32, tag = "11")]
    pub reducer_count: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SubmitJobResponse {
    /// The id the job was registered under.
    #[prost(uint32, tag = "1")]
    pub job_id: u32,
    #[prost(uint32, tag = "2")]
    pub block_count: u32,
}

/////////////////////////////////////////////////////////////////////////////
// Introspection
/////////////////////////////////////////////////////////////////////////////

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct JobsRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct JobSummary {
    #[prost(uint32, tag = "1")]
    pub job_id: u32,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(enumeration = "JobStatus", tag = "3")]
    pub status: i32,
    #[prost(uint32, tag = "4")]
    pub map_tasks: u32,
    #[prost(uint32, tag = "5")]
    pub reduce_tasks: u32,
    #[prost(uint32, tag = "6")]
    pub finished_maps: u32,
    #[prost(uint32, tag = "7")]
    pub finished_reduces: u32,
    #[prost(bool, tag = "8")]
    pub done: bool,
    #[prost(uint32, tag = "9")]
    pub block_count: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct JobsResponse {
    #[prost(message, repeated, tag = "1")]
    pub jobs: Vec<JobSummary>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StatusRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StatusResponse {
    /// Names of the workers currently registered.
    #[prost(string, repeated, tag = "1")]
    pub workers: Vec<String>,
    #[prost(uint32, tag = "2")]
    pub job_count: u32,
    #[prost(uint32, tag = "3")]
    pub init_tasks: u32,
    #[prost(uint32, tag = "4")]
    pub running_tasks: u32,
    #[prost(uint32, tag = "5")]
    pub succeeded_tasks: u32,
    #[prost(uint32, tag = "6")]
    pub failed_tasks: u32,
}

/////////////////////////////////////////////////////////////////////////////
// Worker and scheduler channel
/////////////////////////////////////////////////////////////////////////////

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HeartbeatRequest {
    #[prost(string, tag = "1")]
    pub worker_name: String,
    /// Worker send time, milliseconds since the UNIX epoch.
    #[prost(uint64, tag = "2")]
    pub timestamp: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HeartbeatResponse {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReportProgressRequest {
    #[prost(uint32, tag = "1")]
    pub task_id: u32,
    #[prost(float, tag = "2")]
    pub percentage: f32,
    /// Worker send time, milliseconds since the UNIX epoch.
    #[prost(uint64, tag = "3")]
    pub timestamp: u64,
    #[prost(enumeration = "TaskStatus", tag = "4")]
    pub status: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReportProgressResponse {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AddTaskRequest {
    #[prost(uint32, tag = "1")]
    pub job_id: u32,
    #[prost(uint32, tag = "2")]
    pub task_id: u32,
    #[prost(enumeration = "TaskKind", tag = "3")]
    pub kind: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AddTaskResponse {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateJobStatusRequest {
    #[prost(uint32, tag = "1")]
    pub job_id: u32,
    #[prost(enumeration = "JobStatus", tag = "2")]
    pub status: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateJobStatusResponse {}

/////////////////////////////////////////////////////////////////////////////
// Conversions to and from the domain types
/////////////////////////////////////////////////////////////////////////////

impl From<job::JobStatus> for JobStatus {
    fn from(status: job::JobStatus) -> Self {
        match status {
            job::JobStatus::Init => JobStatus::Init,
            job::JobStatus::InProgress => JobStatus::InProgress,
            job::JobStatus::Failed => JobStatus::Failed,
            job::JobStatus::Succeed => JobStatus::Succeed,
        }
    }
}

impl From<job::TaskKind> for TaskKind {
    fn from(kind: job::TaskKind) -> Self {
        match kind {
            job::TaskKind::Map => TaskKind::Map,
            job::TaskKind::Reduce => TaskKind::Reduce,
        }
    }
}

impl From<job::TaskStatus> for TaskStatus {
    fn from(status: job::TaskStatus) -> Self {
        match status {
            job::TaskStatus::Init => TaskStatus::Init,
            job::TaskStatus::Running => TaskStatus::Running,
            job::TaskStatus::Succeed => TaskStatus::Succeed,
            job::TaskStatus::Failed => TaskStatus::Failed,
        }
    }
}

/// Decode a wire job status. `None` for unspecified or unknown values.
pub fn job_status_from_wire(value: i32) -> Option<job::JobStatus> {
    match JobStatus::try_from(value).ok()? {
        JobStatus::Unspecified => None,
        JobStatus::Init => Some(job::JobStatus::Init),
        JobStatus::InProgress => Some(job::JobStatus::InProgress),
        JobStatus::Failed => Some(job::JobStatus::Failed),
        JobStatus::Succeed => Some(job::JobStatus::Succeed),
    }
}

/// Decode a wire task kind. `None` for unspecified or unknown values.
pub fn task_kind_from_wire(value: i32) -> Option<job::TaskKind> {
    match TaskKind::try_from(value).ok()? {
        TaskKind::Unspecified => None,
        TaskKind::Map => Some(job::TaskKind::Map),
        TaskKind::Reduce => Some(job::TaskKind::Reduce),
    }
}

/// Decode a wire task status. `None` for unspecified or unknown values.
pub fn task_status_from_wire(value: i32) -> Option<job::TaskStatus> {
    match TaskStatus::try_from(value).ok()? {
        TaskStatus::Unspecified => None,
        TaskStatus::Init => Some(job::TaskStatus::Init),
        TaskStatus::Running => Some(job::TaskStatus::Running),
        TaskStatus::Succeed => Some(job::TaskStatus::Succeed),
        TaskStatus::Failed => Some(job::TaskStatus::Failed),
    }
}

impl From<SubmitJobRequest> for JobDescriptor {
    fn from(request: SubmitJobRequest) -> Self {
        Self {
            job_id: (request.job_id != 0).then_some(request.job_id),
            name: request.name,
            logic: LogicHandles {
                mapper: request.mapper,
                reducer: request.reducer,
                partitioner: request.partitioner,
                input_format: request.input_format,
                output_format: request.output_format,
            },
            input_path: PathBuf::from(request.input_path),
            output_path: PathBuf::from(request.output_path),
            block_size: request.block_size,
            reducer_count: request.reducer_count,
        }
    }
}

impl From<&JobDescriptor> for SubmitJobRequest {
    fn from(descriptor: &JobDescriptor) -> Self {
        Self {
            job_id: descriptor.job_id.unwrap_or(0),
            name: descriptor.name.clone(),
            mapper: descriptor.logic.mapper.clone(),
            reducer: descriptor.logic.reducer.clone(),
            partitioner: descriptor.logic.partitioner.clone(),
            input_format: descriptor.logic.input_format.clone(),
            output_format: descriptor.logic.output_format.clone(),
            input_path: descriptor.input_path.to_string_lossy().into_owned(),
            output_path: descriptor.output_path.to_string_lossy().into_owned(),
            block_size: descriptor.block_size,
            reducer_count: descriptor.reducer_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_job_id_means_unassigned() {
        let request = SubmitJobRequest {
            job_id: 0,
            name: "wc".into(),
            input_path: "/data/in".into(),
            block_size: 64,
            ..Default::default()
        };

        let descriptor = JobDescriptor::from(request);
        assert_eq!(descriptor.job_id, None);
        assert_eq!(descriptor.input_path, PathBuf::from("/data/in"));

        let back = SubmitJobRequest::from(&descriptor);
        assert_eq!(back.job_id, 0);
        assert_eq!(back.block_size, 64);
    }

    #[test]
    fn unspecified_and_unknown_enums_decode_to_none() {
        assert_eq!(task_status_from_wire(0), None);
        assert_eq!(task_status_from_wire(42), None);
        assert_eq!(
            task_status_from_wire(TaskStatus::Succeed as i32),
            Some(job::TaskStatus::Succeed)
        );
        assert_eq!(task_kind_from_wire(TaskKind::Reduce as i32), Some(job::TaskKind::Reduce));
        assert_eq!(job_status_from_wire(JobStatus::InProgress as i32), Some(job::JobStatus::InProgress));
        assert_eq!(job_status_from_wire(-1), None);
    }
}
