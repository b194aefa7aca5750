use anyhow::Result;
use tonic::transport::Channel;

//
// Import gRPC stubs/definitions.
//
use common::rpc::{
    self, AddTaskRequest, CoordinatorClient, GetJobIdRequest, HeartbeatRequest, JobsRequest,
    ReportProgressRequest, StatusRequest, SubmitJobRequest, UpdateJobStatusRequest,
};
use common::clock::now_millis;
use common::JobDescriptor;

pub type Client = CoordinatorClient<Channel>;

pub async fn connect(address: &str) -> Result<Client> {
    Ok(CoordinatorClient::connect(address.to_string()).await?)
}

fn job_status_label(value: i32) -> String {
    rpc::job_status_from_wire(value)
        .map(|status| status.to_string())
        .unwrap_or_else(|| format!("unknown({value})"))
}

pub async fn job_id(client: &mut Client) -> Result<()> {
    let response = client.get_job_id(GetJobIdRequest {}).await?;
    println!("{}", response.into_inner().job_id);
    Ok(())
}

pub async fn submit(client: &mut Client, descriptor: &JobDescriptor) -> Result<()> {
    let request = SubmitJobRequest::from(descriptor);
    let response = client.submit_job(request).await?.into_inner();

    println!(
        "Submitted job {} ({} input blocks)",
        response.job_id, response.block_count
    );
    Ok(())
}

pub async fn jobs(client: &mut Client) -> Result<()> {
    let jobs = client.jobs(JobsRequest {}).await?.into_inner().jobs;

    println!("[Jobs]");
    if jobs.is_empty() {
        println!("No jobs.");
        return Ok(());
    }

    println!(
        "{:>6}  {:<20} {:<12} {:>6} {:>9} {:>9} {:>5}",
        "ID", "NAME", "STATUS", "BLOCKS", "MAPS", "REDUCES", "DONE"
    );
    for job in jobs {
        println!(
            "{:>6}  {:<20} {:<12} {:>6} {:>9} {:>9} {:>5}",
            job.job_id,
            job.name,
            job_status_label(job.status),
            job.block_count,
            format!("{}/{}", job.finished_maps, job.map_tasks),
            format!("{}/{}", job.finished_reduces, job.reduce_tasks),
            job.done
        );
    }
    Ok(())
}

pub async fn status(client: &mut Client) -> Result<()> {
    let status = client.status(StatusRequest {}).await?.into_inner();

    println!("[Status]");
    println!("Jobs: {}", status.job_count);
    println!(
        "Tasks: {} init, {} running, {} succeeded, {} failed",
        status.init_tasks, status.running_tasks, status.succeeded_tasks, status.failed_tasks
    );
    println!("Workers ({}):", status.workers.len());
    for worker in status.workers {
        println!("  {}", worker);
    }
    Ok(())
}

pub async fn add_task(client: &mut Client, job_id: u32, task_id: u32, kind: rpc::TaskKind) -> Result<()> {
    client
        .add_task(AddTaskRequest {
            job_id,
            task_id,
            kind: kind as i32,
        })
        .await?;
    println!("Task {} added to job {}", task_id, job_id);
    Ok(())
}

pub async fn heartbeat(client: &mut Client, worker_name: String) -> Result<()> {
    client
        .heartbeat(HeartbeatRequest {
            worker_name,
            timestamp: now_millis(),
        })
        .await?;
    Ok(())
}

pub async fn report(client: &mut Client, task_id: u32, percentage: f32, status: rpc::TaskStatus) -> Result<()> {
    client
        .report_progress(ReportProgressRequest {
            task_id,
            percentage,
            timestamp: now_millis(),
            status: status as i32,
        })
        .await?;
    Ok(())
}

pub async fn set_status(client: &mut Client, job_id: u32, status: rpc::JobStatus) -> Result<()> {
    client
        .update_job_status(UpdateJobStatusRequest {
            job_id,
            status: status as i32,
        })
        .await?;
    println!("Job {} is now {}", job_id, job_status_label(status as i32));
    Ok(())
}
