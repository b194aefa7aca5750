use clap::{Parser, Subcommand, ValueEnum};

use common::rpc;

/// Default block size for submitted jobs, 64 MiB.
const DEFAULT_BLOCK_SIZE: i64 = 64 * 1024 * 1024;

//
// For parsing user specified command.
//
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Address of the coordinator.
    #[arg(short, long, global = true, default_value = "http://[::1]:8030")]
    pub address: String,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reserve a job id for a later submission.
    JobId,
    /// Submit a job to the cluster.
    Submit {
        /// Name of the job.
        #[arg(short, long)]
        name: String,

        /// Input file, or a directory of input files.
        #[arg(short, long)]
        input: String,

        /// Output directory.
        #[arg(short, long)]
        output: String,

        /// Split size in bytes.
        #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
        block_size: i64,

        #[arg(short, long, default_value_t = 1)]
        reducers: u32,

        /// Id obtained with `job-id`. The coordinator picks one if omitted.
        #[arg(long)]
        job_id: Option<u32>,

        #[arg(long, default_value = "")]
        mapper: String,

        #[arg(long, default_value = "")]
        reducer: String,

        #[arg(long, default_value = "")]
        partitioner: String,

        #[arg(long, default_value = "")]
        input_format: String,

        #[arg(long, default_value = "")]
        output_format: String,
    },
    /// List all jobs which have been submitted to the system and their statuses.
    Jobs,
    /// Display the health status of the system: registered workers, job count
    /// and how many tasks are in each state.
    Status,
    /// Dispatch a task of a job (scheduler stand-in).
    AddTask {
        job_id: u32,
        task_id: u32,
        #[arg(value_enum)]
        kind: Kind,
    },
    /// Send a heartbeat as the named worker.
    Heartbeat { worker_name: String },
    /// Report task progress (worker stand-in).
    Report {
        task_id: u32,
        percentage: f32,
        #[arg(short, long, value_enum, default_value_t = Progress::Running)]
        status: Progress,
    },
    /// Set the status of a job.
    SetStatus {
        job_id: u32,
        #[arg(value_enum)]
        status: State,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Map,
    Reduce,
}

impl From<Kind> for rpc::TaskKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Map => rpc::TaskKind::Map,
            Kind::Reduce => rpc::TaskKind::Reduce,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    Running,
    Succeed,
    Failed,
}

impl From<Progress> for rpc::TaskStatus {
    fn from(progress: Progress) -> Self {
        match progress {
            Progress::Running => rpc::TaskStatus::Running,
            Progress::Succeed => rpc::TaskStatus::Succeed,
            Progress::Failed => rpc::TaskStatus::Failed,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Init,
    InProgress,
    Failed,
    Succeed,
}

impl From<State> for rpc::JobStatus {
    fn from(state: State) -> Self {
        match state {
            State::Init => rpc::JobStatus::Init,
            State::InProgress => rpc::JobStatus::InProgress,
            State::Failed => rpc::JobStatus::Failed,
            State::Succeed => rpc::JobStatus::Succeed,
        }
    }
}

pub fn parse_args() -> Args {
    Args::parse()
}
