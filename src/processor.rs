//! Task processor: dispatches a job's tasks to workers and records the
//! outcome of each message stream.
//!
//! The processor owns the RUNNING/DONE/ERROR transitions the worker protocol
//! implies. Tasks are independent; each worker's stream is consumed to its
//! terminal message regardless of how sibling tasks fare, and concurrency is
//! bounded only by the configured worker budget.

use std::sync::Arc;

use ladderforge_common::{JobId, Result, WorkflowStatus};
use ladderforge_db::models::Task;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::store::WorkflowStore;
use crate::worker::{EncodingInstructions, WorkerMessage, WorkerUnit};

pub struct TaskProcessor {
    store: Arc<dyn WorkflowStore>,
    worker: WorkerUnit,
    max_concurrent: usize,
}

impl TaskProcessor {
    pub fn new(store: Arc<dyn WorkflowStore>, worker: WorkerUnit, max_concurrent: usize) -> Self {
        Self {
            store,
            worker,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Run all of a job's NEW tasks to a terminal state, then aggregate the
    /// job itself to DONE or ERROR.
    pub async fn process_job(&self, job_id: JobId) -> Result<()> {
        let tasks: Vec<Task> = self
            .store
            .tasks_for_job(job_id)?
            .into_iter()
            .filter(|t| t.status == WorkflowStatus::New)
            .collect();

        tracing::info!(job = %job_id, tasks = tasks.len(), "processing job");

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut set = JoinSet::new();

        for task in tasks {
            let store = Arc::clone(&self.store);
            let worker = self.worker.clone();
            let semaphore = Arc::clone(&semaphore);

            set.spawn(async move {
                // Closed only if the processor is torn down mid-flight.
                let Ok(_permit) = semaphore.acquire().await else {
                    return;
                };
                run_task(store, worker, task).await;
            });
        }

        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                tracing::error!("task runner panicked: {e}");
            }
        }

        self.aggregate_job(job_id)
    }

    /// A job is DONE when every task is DONE; any task in ERROR fails it.
    /// A job with no tasks at all (e.g. one rejected at split time) is left
    /// untouched.
    fn aggregate_job(&self, job_id: JobId) -> Result<()> {
        let tasks = self.store.tasks_for_job(job_id)?;
        if tasks.is_empty() {
            return Ok(());
        }
        let mut job = self.store.get_job(job_id)?;

        let failed = tasks
            .iter()
            .filter(|t| t.status == WorkflowStatus::Error)
            .count();

        if failed > 0 {
            job.fail(format!("{failed} task(s) failed"));
        } else if tasks.iter().all(|t| t.status == WorkflowStatus::Done) {
            job.status = WorkflowStatus::Done;
            job.status_message = None;
        } else {
            // Some tasks never reached a terminal state (e.g. their insert
            // failed during splitting); leave the job as-is.
            tracing::warn!(job = %job_id, "job has non-terminal tasks after processing");
            return Ok(());
        }

        self.store.update_job(&job)
    }
}

/// Drive one task through one worker to its terminal state.
async fn run_task(store: Arc<dyn WorkflowStore>, worker: WorkerUnit, task: Task) {
    if let Err(e) = store.update_task_status(task.id, WorkflowStatus::Running, None) {
        tracing::error!(task = %task.id, "could not mark task running: {e}");
        return;
    }

    tracing::info!(task = %task.id, name = %task.name, "task started");

    let mut handle = worker.spawn(EncodingInstructions::from(&task));
    let mut terminal_seen = false;

    while let Some(message) = handle.messages.recv().await {
        match &message {
            WorkerMessage::Progress { percent } => {
                tracing::debug!(task = %task.id, percent, "{message}");
            }
            WorkerMessage::Done { .. } => {
                terminal_seen = true;
                tracing::info!(task = %task.id, "{message}");
                if let Err(e) = store.update_task_status(
                    task.id,
                    WorkflowStatus::Done,
                    Some(&message.to_string()),
                ) {
                    tracing::error!(task = %task.id, "could not mark task done: {e}");
                }
            }
            WorkerMessage::Error { .. } => {
                terminal_seen = true;
                tracing::error!(task = %task.id, "{message}");
                if let Err(e) = store.update_task_status(
                    task.id,
                    WorkflowStatus::Error,
                    Some(&message.to_string()),
                ) {
                    tracing::error!(task = %task.id, "could not mark task failed: {e}");
                }
            }
        }
    }

    if !terminal_seen {
        // The worker died without reporting; record that as a task error.
        let _ = store.update_task_status(
            task.id,
            WorkflowStatus::Error,
            Some("worker terminated without a result"),
        );
    }
}
