//! JobTracker coordination core.
//!
//! Tracks submitted jobs, the progress of every dispatched task and the
//! liveness of workers, and serves them over the `coordinator.Coordinator`
//! gRPC service.

pub mod config;
pub mod core;
pub mod error;
pub mod jobs;
pub mod shutdown;
pub mod sweeper;
pub mod task_progress;
pub mod worker_info;
pub mod worker_registry;

pub use crate::core::{CoordinatorServer, JobTracker};
pub use config::TrackerConfig;
pub use error::{Result, TrackerError};
