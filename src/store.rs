//! Persistence seam between the workflow core and the durable store.
//!
//! The splitter and processor talk to this trait; the SQLite implementation
//! delegates to `ladderforge-db`. Every method is a single atomic record
//! operation, and a failure on one call never implies anything about its
//! siblings.

use ladderforge_common::{JobId, Result, TaskId, WorkflowStatus};
use ladderforge_db::{
    models::{Job, Task},
    pool::{get_conn, DbPool},
    queries,
};

/// Durable store operations the workflow core needs.
pub trait WorkflowStore: Send + Sync {
    /// Persist a freshly built task. All-or-nothing for this one record.
    fn add_task(&self, task: &Task) -> Result<()>;

    /// Persist a job's status/status_message.
    fn update_job(&self, job: &Job) -> Result<()>;

    /// Transition a task's status.
    fn update_task_status(
        &self,
        id: TaskId,
        status: WorkflowStatus,
        message: Option<&str>,
    ) -> Result<()>;

    fn get_job(&self, id: JobId) -> Result<Job>;

    fn tasks_for_job(&self, job_id: JobId) -> Result<Vec<Task>>;
}

/// SQLite-backed store over the shared connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl WorkflowStore for SqliteStore {
    fn add_task(&self, task: &Task) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        queries::tasks::add_task(&conn, task)
    }

    fn update_job(&self, job: &Job) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        queries::jobs::update_job(&conn, job)
    }

    fn update_task_status(
        &self,
        id: TaskId,
        status: WorkflowStatus,
        message: Option<&str>,
    ) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        if !queries::tasks::update_task_status(&conn, id, status, message)? {
            return Err(ladderforge_common::Error::not_found(format!("task {id}")));
        }
        Ok(())
    }

    fn get_job(&self, id: JobId) -> Result<Job> {
        let conn = get_conn(&self.pool)?;
        queries::jobs::get_job(&conn, id)
    }

    fn tasks_for_job(&self, job_id: JobId) -> Result<Vec<Task>> {
        let conn = get_conn(&self.pool)?;
        queries::tasks::list_tasks_for_job(&conn, job_id)
    }
}
