//! Job query operations.
//!
//! CRUD operations for transcoding job records. Each call is a single
//! SQLite statement, so it is atomic from the caller's perspective.

use chrono::{DateTime, Utc};
use ladderforge_common::{Error, JobId, Result, WorkflowStatus};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::models::Job;

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<Job> {
    Ok(Job {
        id: JobId::from(Uuid::parse_str(&row.get::<_, String>(0)?).unwrap()),
        name: row.get(1)?,
        input_folder: row.get(2)?,
        input_asset: row.get(3)?,
        output_folder: row.get(4)?,
        output_asset: row.get(5)?,
        encoding_type: row.get(6)?,
        status: row
            .get::<_, String>(7)?
            .parse()
            .unwrap_or(WorkflowStatus::New),
        status_message: row.get(8)?,
        created_at: DateTime::parse_from_rfc3339(&row.get::<_, String>(9)?)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

const JOB_COLUMNS: &str = "id, name, input_folder, input_asset, output_folder, output_asset,
                           encoding_type, status, status_message, created_at";

/// Create a new job in state NEW.
#[allow(clippy::too_many_arguments)]
pub fn create_job(
    conn: &Connection,
    name: &str,
    input_folder: &str,
    input_asset: &str,
    output_folder: &str,
    output_asset: &str,
    encoding_type: &str,
) -> Result<Job> {
    let job = Job {
        id: JobId::new(),
        name: name.to_string(),
        input_folder: input_folder.to_string(),
        input_asset: input_asset.to_string(),
        output_folder: output_folder.to_string(),
        output_asset: output_asset.to_string(),
        encoding_type: encoding_type.to_string(),
        status: WorkflowStatus::New,
        status_message: None,
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO jobs (id, name, input_folder, input_asset, output_folder, output_asset,
                           encoding_type, status, status_message, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            job.id.to_string(),
            job.name,
            job.input_folder,
            job.input_asset,
            job.output_folder,
            job.output_asset,
            job.encoding_type,
            job.status.to_string(),
            job.status_message,
            job.created_at.to_rfc3339(),
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(job)
}

/// Get a job by ID.
pub fn get_job(conn: &Connection, id: JobId) -> Result<Job> {
    conn.query_row(
        &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?"),
        [id.to_string()],
        job_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Error::not_found(format!("job {id}")),
        _ => Error::database(e.to_string()),
    })
}

/// Persist a job's mutable fields (status and status message).
pub fn update_job(conn: &Connection, job: &Job) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE jobs SET status = ?, status_message = ? WHERE id = ?",
            params![
                job.status.to_string(),
                job.status_message,
                job.id.to_string()
            ],
        )
        .map_err(|e| Error::database(e.to_string()))?;

    if updated == 0 {
        return Err(Error::not_found(format!("job {}", job.id)));
    }
    Ok(())
}

/// List jobs in a given status, oldest first.
pub fn list_jobs_by_status(
    conn: &Connection,
    status: WorkflowStatus,
    limit: usize,
) -> Result<Vec<Job>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE status = ? ORDER BY created_at ASC LIMIT ?"
        ))
        .map_err(|e| Error::database(e.to_string()))?;

    let jobs = stmt
        .query_map(params![status.to_string(), limit as i64], job_from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;

    #[test]
    fn test_create_and_get_job() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let job = create_job(
            &conn,
            "clip",
            "/in",
            "clip.mov",
            "/out",
            "clip.mp4",
            "sb-vp9-medium",
        )
        .unwrap();
        assert_eq!(job.status, WorkflowStatus::New);

        let fetched = get_job(&conn, job.id).unwrap();
        assert_eq!(fetched, job);
    }

    #[test]
    fn test_get_missing_job_is_not_found() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let err = get_job(&conn, JobId::new()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_update_job_persists_status() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let mut job = create_job(
            &conn,
            "clip",
            "/in",
            "clip.mov",
            "/out",
            "clip.mp4",
            "bogus-profile",
        )
        .unwrap();

        job.fail("Could not find the authoring spec");
        update_job(&conn, &job).unwrap();

        let fetched = get_job(&conn, job.id).unwrap();
        assert_eq!(fetched.status, WorkflowStatus::Error);
        assert!(fetched.status_message.unwrap().contains("authoring spec"));
    }

    #[test]
    fn test_list_jobs_by_status() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        create_job(&conn, "a", "/in", "a.mov", "/out", "a.mp4", "p").unwrap();
        create_job(&conn, "b", "/in", "b.mov", "/out", "b.mp4", "p").unwrap();

        let jobs = list_jobs_by_status(&conn, WorkflowStatus::New, 10).unwrap();
        assert_eq!(jobs.len(), 2);
        assert!(list_jobs_by_status(&conn, WorkflowStatus::Error, 10)
            .unwrap()
            .is_empty());
    }
}
