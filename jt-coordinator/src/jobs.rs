use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use fnv::{FnvHashMap, FnvHashSet};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use common::{split, InputBlock, JobDescriptor, JobId, JobStatus, LogicHandles, TaskId, TaskKind};

use crate::error::{Result, TrackerError};

/// A job context.
///
/// Created once at submission. Task sets and completion counters only change
/// through the methods below.
#[derive(Debug, Clone)]
pub struct Job {
    id: JobId,

    name: String,

    /// Opaque handles to the user's processing logic.
    logic: LogicHandles,

    input_path: PathBuf,

    output_path: PathBuf,

    /// Block size the input was split with.
    block_size: u64,

    reducer_count: u32,

    map_tasks: FnvHashSet<TaskId>,

    reduce_tasks: FnvHashSet<TaskId>,

    /// Tasks already counted as finished.
    finished: FnvHashSet<TaskId>,

    finished_maps: usize,

    finished_reduces: usize,

    /// Input blocks, in split order.
    input_blocks: Vec<InputBlock>,

    status: JobStatus,
}

impl Job {
    fn new(id: JobId, descriptor: JobDescriptor, block_size: u64, input_blocks: Vec<InputBlock>) -> Self {
        Self {
            id,
            name: descriptor.name,
            logic: descriptor.logic,
            input_path: descriptor.input_path,
            output_path: descriptor.output_path,
            block_size,
            reducer_count: descriptor.reducer_count,
            map_tasks: FnvHashSet::default(),
            reduce_tasks: FnvHashSet::default(),
            finished: FnvHashSet::default(),
            finished_maps: 0,
            finished_reduces: 0,
            input_blocks,
            status: JobStatus::Init,
        }
    }

    pub fn get_id(&self) -> JobId {
        self.id
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_logic(&self) -> &LogicHandles {
        &self.logic
    }

    pub fn get_input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn get_output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn get_block_size(&self) -> u64 {
        self.block_size
    }

    pub fn get_reducer_count(&self) -> u32 {
        self.reducer_count
    }

    pub fn get_input_blocks(&self) -> &[InputBlock] {
        &self.input_blocks
    }

    pub fn get_status(&self) -> JobStatus {
        self.status
    }

    pub fn get_map_tasks(&self) -> &FnvHashSet<TaskId> {
        &self.map_tasks
    }

    pub fn get_reduce_tasks(&self) -> &FnvHashSet<TaskId> {
        &self.reduce_tasks
    }

    pub fn finished_maps(&self) -> usize {
        self.finished_maps
    }

    pub fn finished_reduces(&self) -> usize {
        self.finished_reduces
    }

    /// Register a task id under the given kind.
    ///
    /// Adding an id twice to the same set is a no-op. An id already used by
    /// the other kind is rejected, which keeps the two sets disjoint.
    /// Returns true if the id was not registered before.
    pub fn add_task(&mut self, task_id: TaskId, kind: TaskKind) -> Result<bool> {
        let (own, other) = match kind {
            TaskKind::Map => (&mut self.map_tasks, &self.reduce_tasks),
            TaskKind::Reduce => (&mut self.reduce_tasks, &self.map_tasks),
        };

        if other.contains(&task_id) {
            return Err(TrackerError::TaskConflict {
                job_id: Some(self.id),
                task_id,
            });
        }

        Ok(own.insert(task_id))
    }

    pub fn add_map_task(&mut self, task_id: TaskId) -> Result<bool> {
        self.add_task(task_id, TaskKind::Map)
    }

    pub fn add_reduce_task(&mut self, task_id: TaskId) -> Result<bool> {
        self.add_task(task_id, TaskKind::Reduce)
    }

    /// Count a task of this job as finished.
    ///
    /// Returns false when the id belongs to neither set or was already counted.
    pub fn report_finished_task(&mut self, task_id: TaskId) -> bool {
        let is_map = self.map_tasks.contains(&task_id);
        let is_reduce = self.reduce_tasks.contains(&task_id);

        if !(is_map || is_reduce) || !self.finished.insert(task_id) {
            return false;
        }

        if is_map {
            self.finished_maps += 1;
        }
        if is_reduce {
            self.finished_reduces += 1;
        }
        true
    }

    /// Every registered task has been reported finished.
    pub fn is_done(&self) -> bool {
        self.finished_maps + self.finished_reduces == self.map_tasks.len() + self.reduce_tasks.len()
    }

    pub fn set_status(&mut self, status: JobStatus) {
        self.status = status;
    }

    /// Undo a task registration. Finished tasks stay counted.
    fn remove_task(&mut self, task_id: TaskId, kind: TaskKind) -> bool {
        if self.finished.contains(&task_id) {
            return false;
        }
        match kind {
            TaskKind::Map => self.map_tasks.remove(&task_id),
            TaskKind::Reduce => self.reduce_tasks.remove(&task_id),
        }
    }
}

/// All jobs known to the coordinator, plus the job id allocator.
#[derive(Debug)]
pub struct JobRegistry {
    jobs: RwLock<FnvHashMap<JobId, Job>>,

    /// Next id to hand out. Ids below this have been issued.
    next_id: AtomicU32,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(FnvHashMap::default()),
            next_id: AtomicU32::new(1),
        }
    }

    /// Hand out a fresh job id. Ids are never reused within a process.
    pub fn allocate_id(&self) -> JobId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn was_issued(&self, job_id: JobId) -> bool {
        job_id != 0 && job_id < self.next_id.load(Ordering::Relaxed)
    }

    /// Split the job's input and register the job.
    ///
    /// The descriptor's id is honoured only if it was issued by
    /// [`allocate_id`](Self::allocate_id) and no tracked job holds it;
    /// otherwise the job gets a fresh id. Submitting the same descriptor twice
    /// therefore creates two jobs.
    pub async fn create_job(&self, descriptor: JobDescriptor) -> Result<Job> {
        let input_path = descriptor.input_path.clone();
        let block_size = descriptor.block_size;

        // Split before taking the table lock.
        let blocks = tokio::task::spawn_blocking(move || split(&input_path, block_size))
            .await
            .map_err(|e| TrackerError::Internal(format!("input split task failed: {e}")))??;

        let mut jobs = self.jobs.write().await;

        let job_id = match descriptor.job_id {
            Some(id) if self.was_issued(id) && !jobs.contains_key(&id) => id,
            Some(id) => {
                let fresh = self.allocate_id();
                debug!(requested = id, assigned = fresh, "Requested job id unavailable");
                fresh
            }
            None => self.allocate_id(),
        };

        // `split` rejected anything non-positive.
        let job = Job::new(job_id, descriptor, block_size as u64, blocks);
        info!(
            job_id,
            name = %job.name,
            input = %job.input_path.display(),
            blocks = job.input_blocks.len(),
            "Job created"
        );

        jobs.insert(job_id, job.clone());
        Ok(job)
    }

    pub async fn add_map_task(&self, job_id: JobId, task_id: TaskId) -> Result<bool> {
        self.add_task(job_id, task_id, TaskKind::Map).await
    }

    pub async fn add_reduce_task(&self, job_id: JobId, task_id: TaskId) -> Result<bool> {
        self.add_task(job_id, task_id, TaskKind::Reduce).await
    }

    /// Returns true if the task was not part of the job before.
    pub async fn add_task(&self, job_id: JobId, task_id: TaskId, kind: TaskKind) -> Result<bool> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&job_id).ok_or(TrackerError::JobNotFound(job_id))?;
        let added = job.add_task(task_id, kind)?;
        debug!(job_id, task_id, %kind, added, "Task added to job");
        Ok(added)
    }

    /// Drop a task registration that was never reported finished.
    pub async fn remove_task(&self, job_id: JobId, task_id: TaskId, kind: TaskKind) -> bool {
        let mut jobs = self.jobs.write().await;
        jobs.get_mut(&job_id)
            .map(|job| job.remove_task(task_id, kind))
            .unwrap_or(false)
    }

    /// Count a task as finished. Unknown or repeated task ids are ignored.
    pub async fn report_finished_task(&self, job_id: JobId, task_id: TaskId) -> Result<bool> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&job_id).ok_or(TrackerError::JobNotFound(job_id))?;

        let counted = job.report_finished_task(task_id);
        if counted {
            debug!(
                job_id,
                task_id,
                maps = job.finished_maps,
                reduces = job.finished_reduces,
                "Task finished"
            );
        } else {
            warn!(job_id, task_id, "Ignoring finish report for unknown or already counted task");
        }
        Ok(counted)
    }

    pub async fn is_done(&self, job_id: JobId) -> Result<bool> {
        let jobs = self.jobs.read().await;
        jobs.get(&job_id)
            .map(Job::is_done)
            .ok_or(TrackerError::JobNotFound(job_id))
    }

    pub async fn set_status(&self, job_id: JobId, status: JobStatus) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&job_id).ok_or(TrackerError::JobNotFound(job_id))?;

        if job.status != status {
            info!(job_id, from = %job.status, to = %status, "Job status changed");
            job.set_status(status);
        }
        Ok(())
    }

    pub async fn get(&self, job_id: JobId) -> Option<Job> {
        self.jobs.read().await.get(&job_id).cloned()
    }

    /// Snapshot of every tracked job, ordered by id.
    pub async fn jobs(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by_key(|job| job.id);
        jobs
    }

    /// Stop tracking a job. Its id is not handed out again.
    pub async fn remove(&self, job_id: JobId) -> Option<Job> {
        self.jobs.write().await.remove(&job_id)
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}
