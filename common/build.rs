use tonic_build::manual::{Builder, Method, Service};

const CODEC: &str = "tonic::codec::ProstCodec";

/// A unary method whose request/response messages live in `common::rpc`.
fn unary(name: &str, route: &str, input: &str, output: &str) -> Method {
    Method::builder()
        .name(name)
        .route_name(route)
        .input_type(format!("super::{input}"))
        .output_type(format!("super::{output}"))
        .codec_path(CODEC)
        .build()
}

// The messages are plain prost structs in `src/rpc.rs`, so only the service
// stubs are generated here. This keeps the build free of a `protoc` binary.
fn main() {
    let coordinator = Service::builder()
        .name("Coordinator")
        .package("coordinator")
        .method(unary("get_job_id", "GetJobId", "GetJobIdRequest", "GetJobIdResponse"))
        .method(unary("submit_job", "SubmitJob", "SubmitJobRequest", "SubmitJobResponse"))
        .method(unary("jobs", "Jobs", "JobsRequest", "JobsResponse"))
        .method(unary("status", "Status", "StatusRequest", "StatusResponse"))
        .method(unary("heartbeat", "Heartbeat", "HeartbeatRequest", "HeartbeatResponse"))
        .method(unary(
            "report_progress",
            "ReportProgress",
            "ReportProgressRequest",
            "ReportProgressResponse",
        ))
        .method(unary("add_task", "AddTask", "AddTaskRequest", "AddTaskResponse"))
        .method(unary(
            "update_job_status",
            "UpdateJobStatus",
            "UpdateJobStatusRequest",
            "UpdateJobStatusResponse",
        ))
        .build();

    Builder::new().compile(&[coordinator]);
    println!("cargo:rerun-if-changed=build.rs");
}
