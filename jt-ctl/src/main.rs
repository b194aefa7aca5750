mod args;
use args::{parse_args, Commands};

mod core;

use std::path::PathBuf;

use common::{JobDescriptor, LogicHandles};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args();
    let mut client = core::connect(&args.address).await?;

    match args.command {
        Commands::JobId => core::job_id(&mut client).await?,
        Commands::Submit {
            name,
            input,
            output,
            block_size,
            reducers,
            job_id,
            mapper,
            reducer,
            partitioner,
            input_format,
            output_format,
        } => {
            let descriptor = JobDescriptor {
                job_id,
                name,
                logic: LogicHandles {
                    mapper,
                    reducer,
                    partitioner,
                    input_format,
                    output_format,
                },
                input_path: PathBuf::from(input),
                output_path: PathBuf::from(output),
                block_size,
                reducer_count: reducers,
            };
            core::submit(&mut client, &descriptor).await?
        }
        Commands::Jobs => core::jobs(&mut client).await?,
        Commands::Status => core::status(&mut client).await?,
        Commands::AddTask { job_id, task_id, kind } => {
            core::add_task(&mut client, job_id, task_id, kind.into()).await?
        }
        Commands::Heartbeat { worker_name } => core::heartbeat(&mut client, worker_name).await?,
        Commands::Report {
            task_id,
            percentage,
            status,
        } => core::report(&mut client, task_id, percentage, status.into()).await?,
        Commands::SetStatus { job_id, status } => {
            core::set_status(&mut client, job_id, status.into()).await?
        }
    }

    Ok(())
}
