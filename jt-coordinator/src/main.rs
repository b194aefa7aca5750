mod args;

use args::Args;

use clap::Parser;
use tonic::transport::Server;
use tracing::info;

use jt_coordinator::config::TrackerConfig;
use jt_coordinator::shutdown::install_shutdown_handler;
use jt_coordinator::{CoordinatorServer, JobTracker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Retrieve server configuration from command line.
    // Note: There are default values for EACH argument.
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = TrackerConfig::from(&args);
    let addr = config.listen_addr;

    let shutdown = install_shutdown_handler();
    let tracker = JobTracker::new(config);
    let sweepers = tracker.spawn_sweepers(shutdown.clone());

    info!(
        %addr,
        liveness_cycle_ms = tracker.config().liveness_cycle_ms(),
        "JobTracker listening"
    );

    let signal = shutdown.clone();
    Server::builder()
        .add_service(CoordinatorServer::new(tracker))
        .serve_with_shutdown(addr, async move { signal.cancelled().await })
        .await?;

    // The server may also stop on a transport error.
    shutdown.cancel();
    for sweeper in sweepers {
        sweeper.await?;
    }

    info!("JobTracker stopped");
    Ok(())
}
