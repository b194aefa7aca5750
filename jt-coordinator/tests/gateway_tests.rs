//! End-to-end tests of the coordinator service over a real gRPC connection.

use std::collections::HashSet;
use std::io::Write;
use std::net::SocketAddr;

use tempfile::NamedTempFile;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::{Channel, Server};
use tonic::Code;

use common::rpc::{
    AddTaskRequest, CoordinatorClient, GetJobIdRequest, HeartbeatRequest, JobStatus, JobsRequest,
    ReportProgressRequest, StatusRequest, SubmitJobRequest, TaskKind, TaskStatus,
    UpdateJobStatusRequest,
};
use jt_coordinator::{CoordinatorServer, JobTracker, TrackerConfig};

struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
}

impl TestServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();

        let tracker = JobTracker::new(TrackerConfig::default());
        let token = shutdown.clone();
        tokio::spawn(async move {
            Server::builder()
                .add_service(CoordinatorServer::new(tracker))
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                    token.cancelled().await
                })
                .await
                .unwrap();
        });

        Self { addr, shutdown }
    }

    async fn client(&self) -> CoordinatorClient<Channel> {
        CoordinatorClient::connect(format!("http://{}", self.addr))
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn input_file(len: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&vec![b'a'; len]).unwrap();
    file
}

fn submit_request(input: &NamedTempFile, block_size: i64) -> SubmitJobRequest {
    SubmitJobRequest {
        name: "wordcount".to_string(),
        mapper: "WordCountMapper".to_string(),
        reducer: "SumReducer".to_string(),
        input_path: input.path().display().to_string(),
        output_path: "/tmp/wordcount-out".to_string(),
        block_size,
        reducer_count: 2,
        ..Default::default()
    }
}

#[tokio::test]
async fn concurrent_job_ids_are_distinct() {
    let server = TestServer::start().await;
    let client = server.client().await;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let mut client = client.clone();
        handles.push(tokio::spawn(async move {
            client
                .get_job_id(GetJobIdRequest {})
                .await
                .unwrap()
                .into_inner()
                .job_id
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        let id = handle.await.unwrap();
        assert_ne!(id, 0);
        assert!(ids.insert(id), "job id {id} issued twice");
    }
}

#[tokio::test]
async fn submit_splits_input_and_keeps_issued_id() {
    let server = TestServer::start().await;
    let mut client = server.client().await;
    let input = input_file(1_000);

    let job_id = client.get_job_id(GetJobIdRequest {}).await.unwrap().into_inner().job_id;

    let mut request = submit_request(&input, 300);
    request.job_id = job_id;
    let response = client.submit_job(request).await.unwrap().into_inner();
    assert_eq!(response.job_id, job_id);
    assert_eq!(response.block_count, 3);

    let jobs = client.jobs(JobsRequest {}).await.unwrap().into_inner().jobs;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].job_id, job_id);
    assert_eq!(jobs[0].name, "wordcount");
    assert_eq!(jobs[0].status, JobStatus::Init as i32);
    assert!(jobs[0].done);
}

#[tokio::test]
async fn submit_with_non_positive_block_size_is_rejected() {
    let server = TestServer::start().await;
    let mut client = server.client().await;
    let input = input_file(100);

    let err = client.submit_job(submit_request(&input, -1)).await.unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);

    let jobs = client.jobs(JobsRequest {}).await.unwrap().into_inner().jobs;
    assert!(jobs.is_empty());
}

#[tokio::test]
async fn submit_with_missing_input_is_rejected() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    let request = SubmitJobRequest {
        input_path: "/definitely/not/here".to_string(),
        block_size: 64,
        ..Default::default()
    };
    let err = client.submit_job(request).await.unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn heartbeat_registers_worker() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    for name in ["tt-2", "tt-1", "tt-2"] {
        client
            .heartbeat(HeartbeatRequest {
                worker_name: name.to_string(),
                timestamp: 0,
            })
            .await
            .unwrap();
    }

    let status = client.status(StatusRequest {}).await.unwrap().into_inner();
    assert_eq!(status.workers, vec!["tt-1".to_string(), "tt-2".to_string()]);
}

#[tokio::test]
async fn task_lifecycle_over_the_wire() {
    let server = TestServer::start().await;
    let mut client = server.client().await;
    let input = input_file(500);

    let job_id = client
        .submit_job(submit_request(&input, 256))
        .await
        .unwrap()
        .into_inner()
        .job_id;

    for (task_id, kind) in [(1, TaskKind::Map), (2, TaskKind::Map), (3, TaskKind::Reduce)] {
        client
            .add_task(AddTaskRequest {
                job_id,
                task_id,
                kind: kind as i32,
            })
            .await
            .unwrap();
    }

    client
        .report_progress(ReportProgressRequest {
            task_id: 1,
            percentage: 50.0,
            timestamp: 0,
            status: TaskStatus::Running as i32,
        })
        .await
        .unwrap();

    let status = client.status(StatusRequest {}).await.unwrap().into_inner();
    assert_eq!(status.job_count, 1);
    assert_eq!(status.init_tasks, 2);
    assert_eq!(status.running_tasks, 1);

    for task_id in 1..=3 {
        client
            .report_progress(ReportProgressRequest {
                task_id,
                percentage: 100.0,
                timestamp: 0,
                status: TaskStatus::Succeed as i32,
            })
            .await
            .unwrap();
    }

    let jobs = client.jobs(JobsRequest {}).await.unwrap().into_inner().jobs;
    assert_eq!(jobs[0].map_tasks, 2);
    assert_eq!(jobs[0].reduce_tasks, 1);
    assert_eq!(jobs[0].finished_maps, 2);
    assert_eq!(jobs[0].finished_reduces, 1);
    assert!(jobs[0].done);

    client
        .update_job_status(UpdateJobStatusRequest {
            job_id,
            status: JobStatus::Succeed as i32,
        })
        .await
        .unwrap();
    let jobs = client.jobs(JobsRequest {}).await.unwrap().into_inner().jobs;
    assert_eq!(jobs[0].status, JobStatus::Succeed as i32);
}

#[tokio::test]
async fn progress_for_unknown_task_is_not_found() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    let err = client
        .report_progress(ReportProgressRequest {
            task_id: 77,
            percentage: 10.0,
            timestamp: 0,
            status: TaskStatus::Running as i32,
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::NotFound);
}
