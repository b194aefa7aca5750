//! Shared pieces of the JobTracker workspace: the job and task vocabulary used
//! by the coordinator and its clients, input splitting, and the RPC contract
//! spoken between them.

pub mod clock;
pub mod job;
pub mod rpc;
pub mod split;

pub use job::{JobDescriptor, JobId, JobStatus, LogicHandles, TaskId, TaskKind, TaskStatus};
pub use split::{split, InputBlock, SplitError};
