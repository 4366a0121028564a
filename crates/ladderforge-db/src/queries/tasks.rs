//! Task query operations.
//!
//! Tasks are built by the job splitter and inserted whole; afterwards only
//! their status/status_message change. Each statement is atomic, so one
//! track's failed insert cannot affect its siblings.

use chrono::{DateTime, Utc};
use ladderforge_common::{Error, JobId, Result, TaskId, TaskType, VideoSize, WorkflowStatus};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::models::Task;

const TASK_COLUMNS: &str = "id, job_id, name, task_type, input_folder, input_asset, output_folder,
                            output_asset, video_encoder, video_size, video_bitrate, video_fps,
                            audio_encoder, audio_bitrate, audio_frequency, audio_channels,
                            screenshots, packager, status, status_message, created_at";

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: TaskId::from(Uuid::parse_str(&row.get::<_, String>(0)?).unwrap()),
        job_id: JobId::from(Uuid::parse_str(&row.get::<_, String>(1)?).unwrap()),
        name: row.get(2)?,
        task_type: row
            .get::<_, String>(3)?
            .parse()
            .unwrap_or(TaskType::Encoding),
        input_folder: row.get(4)?,
        input_asset: row.get(5)?,
        output_folder: row.get(6)?,
        output_asset: row.get(7)?,
        video_encoder: row.get(8)?,
        video_size: row
            .get::<_, String>(9)?
            .parse()
            .unwrap_or(VideoSize::new(0, 0)),
        video_bitrate: row.get(10)?,
        video_fps: row.get(11)?,
        audio_encoder: row.get(12)?,
        audio_bitrate: row.get(13)?,
        audio_frequency: row.get(14)?,
        audio_channels: row.get(15)?,
        screenshots: row.get(16)?,
        packager: row.get(17)?,
        status: row
            .get::<_, String>(18)?
            .parse()
            .unwrap_or(WorkflowStatus::New),
        status_message: row.get(19)?,
        created_at: DateTime::parse_from_rfc3339(&row.get::<_, String>(20)?)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

/// Insert a task built by the splitter.
pub fn add_task(conn: &Connection, task: &Task) -> Result<()> {
    conn.execute(
        "INSERT INTO tasks (id, job_id, name, task_type, input_folder, input_asset,
                            output_folder, output_asset, video_encoder, video_size,
                            video_bitrate, video_fps, audio_encoder, audio_bitrate,
                            audio_frequency, audio_channels, screenshots, packager,
                            status, status_message, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            task.id.to_string(),
            task.job_id.to_string(),
            task.name,
            task.task_type.to_string(),
            task.input_folder,
            task.input_asset,
            task.output_folder,
            task.output_asset,
            task.video_encoder,
            task.video_size.to_string(),
            task.video_bitrate,
            task.video_fps,
            task.audio_encoder,
            task.audio_bitrate,
            task.audio_frequency,
            task.audio_channels,
            task.screenshots,
            task.packager,
            task.status.to_string(),
            task.status_message,
            task.created_at.to_rfc3339(),
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

/// Get a task by ID.
pub fn get_task(conn: &Connection, id: TaskId) -> Result<Task> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"),
        [id.to_string()],
        task_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Error::not_found(format!("task {id}")),
        _ => Error::database(e.to_string()),
    })
}

/// List all tasks belonging to a job, in creation order.
pub fn list_tasks_for_job(conn: &Connection, job_id: JobId) -> Result<Vec<Task>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE job_id = ? ORDER BY created_at ASC, id ASC"
        ))
        .map_err(|e| Error::database(e.to_string()))?;

    let tasks = stmt
        .query_map([job_id.to_string()], task_from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(tasks)
}

/// Transition a task to a new status with an optional message.
///
/// Returns `true` if a row was updated.
pub fn update_task_status(
    conn: &Connection,
    id: TaskId,
    status: WorkflowStatus,
    message: Option<&str>,
) -> Result<bool> {
    let updated = conn
        .execute(
            "UPDATE tasks SET status = ?, status_message = ? WHERE id = ?",
            params![status.to_string(), message, id.to_string()],
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(updated > 0)
}
