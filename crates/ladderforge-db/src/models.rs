//! Internal Rust models matching the database schema.
//!
//! These map one-to-one onto the `jobs` and `tasks` tables and use the typed
//! IDs and enums from ladderforge-common.

use chrono::{DateTime, Utc};
use ladderforge_common::{JobId, TaskId, TaskType, VideoSize, WorkflowStatus};
use serde::{Deserialize, Serialize};

/// A transcoding request as submitted by a caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: JobId,
    pub name: String,
    pub input_folder: String,
    pub input_asset: String,
    pub output_folder: String,
    pub output_asset: String,
    /// Authoring profile key this job resolves against.
    pub encoding_type: String,
    pub status: WorkflowStatus,
    pub status_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Mark the job failed with a human-readable reason.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = WorkflowStatus::Error;
        self.status_message = Some(message.into());
    }
}

/// One unit of dispatchable work derived from a Job and one ladder track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: TaskId,
    /// Owning job; tasks never reference each other.
    pub job_id: JobId,
    pub name: String,
    pub task_type: TaskType,
    pub input_folder: String,
    pub input_asset: String,
    pub output_folder: String,
    pub output_asset: String,
    pub video_encoder: String,
    pub video_size: VideoSize,
    /// Video bitrate in kbit/s.
    pub video_bitrate: u32,
    pub video_fps: u32,
    pub audio_encoder: String,
    pub audio_bitrate: String,
    pub audio_frequency: String,
    pub audio_channels: u32,
    pub screenshots: bool,
    /// Packager tag for packaging tasks; carried opaquely.
    pub packager: Option<String>,
    pub status: WorkflowStatus,
    pub status_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_fail_sets_status_and_message() {
        let mut job = Job {
            id: JobId::new(),
            name: "clip".to_string(),
            input_folder: "/in".to_string(),
            input_asset: "clip.mov".to_string(),
            output_folder: "/out".to_string(),
            output_asset: "clip.mp4".to_string(),
            encoding_type: "sb-x264-medium".to_string(),
            status: WorkflowStatus::New,
            status_message: None,
            created_at: Utc::now(),
        };

        job.fail("Video Duration");
        assert_eq!(job.status, WorkflowStatus::Error);
        assert_eq!(job.status_message.as_deref(), Some("Video Duration"));
    }
}
