//! Job splitter: turns one job into zero-or-more persisted tasks.
//!
//! Splitting is declarative and ladder-driven. The splitter resolves the
//! job's profile, gates on the profile's duration ceiling before any task
//! exists, then persists one task per track. Validation failures end inside
//! this module: the job is failed and persisted, and the caller gets a
//! [`SplitOutcome::Rejected`] rather than an error.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use ladderforge_common::{container_extension, Result, TaskId, TaskType, WorkflowStatus};
use ladderforge_db::models::{Job, Task};

use crate::authoring::{AuthoringRegistry, EncodeTrack};
use crate::probe::{max_av_duration, MediaProbe};
use crate::store::WorkflowStore;

/// Result of splitting one job.
#[derive(Debug)]
pub enum SplitOutcome {
    /// Validation failed; the job was marked ERROR and persisted, and no
    /// tasks were created.
    Rejected { reason: String },
    /// Tasks were generated; per-track persistence results are reported
    /// individually.
    Split(SplitReport),
}

/// Per-track persistence results. A failed insert for one track never
/// suppresses its siblings; each entry stands alone.
#[derive(Debug, Default)]
pub struct SplitReport {
    pub created: Vec<TaskId>,
    pub failed: Vec<(String, ladderforge_common::Error)>,
}

pub struct JobSplitter {
    registry: Arc<AuthoringRegistry>,
    store: Arc<dyn WorkflowStore>,
    probe: Arc<dyn MediaProbe>,
}

impl JobSplitter {
    pub fn new(
        registry: Arc<AuthoringRegistry>,
        store: Arc<dyn WorkflowStore>,
        probe: Arc<dyn MediaProbe>,
    ) -> Self {
        Self {
            registry,
            store,
            probe,
        }
    }

    /// Split `job` into persisted tasks, or fail it.
    ///
    /// Errors are returned only for store failures while persisting the
    /// job's own rejection; everything else is expressed in the outcome.
    pub async fn split(&self, job: &mut Job) -> Result<SplitOutcome> {
        let Some(spec) = self.registry.resolve(&job.encoding_type) else {
            let reason = format!(
                "Could not split job {}: unknown authoring profile {}",
                job.name, job.encoding_type
            );
            tracing::error!("{reason}");
            return self.reject(job, reason).await;
        };

        if let Some(ceiling) = spec.video_max_duration {
            if let Err(reason) = self.check_duration(job, ceiling).await {
                tracing::error!("{reason}");
                return self.reject(job, reason).await;
            }
        }

        let mut report = SplitReport::default();

        for track in &spec.encoding_tracks {
            let task = build_encoding_task(job, track);
            self.persist_task(task, &mut report);
        }
        for track in &spec.packaging_tracks {
            let task = build_packaging_task(job, track);
            self.persist_task(task, &mut report);
        }

        tracing::info!(
            job = %job.id,
            created = report.created.len(),
            failed = report.failed.len(),
            "job split into tasks"
        );
        Ok(SplitOutcome::Split(report))
    }

    /// Each task add is its own discrete store call with its own outcome.
    fn persist_task(&self, task: Task, report: &mut SplitReport) {
        match self.store.add_task(&task) {
            Ok(()) => report.created.push(task.id),
            Err(e) => {
                tracing::warn!(task = %task.name, "failed to persist task: {e}");
                report.failed.push((task.name, e));
            }
        }
    }

    async fn reject(&self, job: &mut Job, reason: String) -> Result<SplitOutcome> {
        job.fail(&reason);
        self.store.update_job(job)?;
        Ok(SplitOutcome::Rejected { reason })
    }

    /// Duration gate for short-form profiles: the source must contain a
    /// video stream and its reported duration must be non-zero and within
    /// the ceiling. Cheaper to reject here than after an encode has run.
    async fn check_duration(&self, job: &Job, ceiling: f64) -> std::result::Result<(), String> {
        let input = Path::new(&job.input_folder).join(&job.input_asset);

        let streams = self
            .probe
            .streams(&input)
            .await
            .map_err(|e| format!("Probe failed for {}: {e}", input.display()))?;

        if !streams.iter().any(|s| s.is_video()) {
            return Err(format!("No video stream in {}", job.input_asset));
        }

        let duration = max_av_duration(&streams).unwrap_or(0.0);
        if duration == 0.0 {
            return Err(format!("Unknown video duration for {}", job.input_asset));
        }
        if duration > ceiling {
            return Err(format!(
                "Video duration {duration}s exceeds the profile limit of {ceiling}s"
            ));
        }

        Ok(())
    }
}

/// Compute an encoding task's output asset name.
///
/// The track's resolution and bitrate are inserted before the extension
/// (appended when the declared name has none), making names pairwise
/// distinct across one job's ladder, and the extension is replaced by the
/// container mapped from the codec family.
pub fn generate_output_asset_name(output_asset: &str, track: &EncodeTrack) -> String {
    let suffix = format!(
        "_{}_{}_{}",
        track.video_size.width, track.video_size.height, track.video_bitrate
    );
    let extension = container_extension(&track.video_encoder);

    match output_asset.rfind('.') {
        Some(dot) => format!("{}{}.{}", &output_asset[..dot], suffix, extension),
        None => format!("{}{}.{}", output_asset, suffix, extension),
    }
}

fn task_from_track(job: &Job, track: &EncodeTrack) -> Task {
    Task {
        id: TaskId::new(),
        job_id: job.id,
        name: String::new(),
        task_type: TaskType::Encoding,
        input_folder: job.input_folder.clone(),
        input_asset: job.input_asset.clone(),
        output_folder: job.output_folder.clone(),
        output_asset: String::new(),
        video_encoder: track.video_encoder.clone(),
        video_size: track.video_size,
        video_bitrate: track.video_bitrate,
        video_fps: track.video_fps,
        audio_encoder: track.audio_encoder.clone(),
        audio_bitrate: track.audio_bitrate.clone(),
        audio_frequency: track.audio_frequency.clone(),
        audio_channels: track.audio_channels,
        screenshots: track.screenshots,
        packager: None,
        status: WorkflowStatus::New,
        status_message: None,
        created_at: Utc::now(),
    }
}

/// Build one ENCODING task from a job and a ladder rung.
pub fn build_encoding_task(job: &Job, track: &EncodeTrack) -> Task {
    let mut task = task_from_track(job, track);
    task.name = format!(
        "{} {} {}",
        job.name, track.video_size, track.video_bitrate
    );
    task.output_asset = generate_output_asset_name(&job.output_asset, track);
    task
}

/// Build one PACKAGING task. Its output asset is the job's bare name; no
/// per-track suffix.
pub fn build_packaging_task(job: &Job, track: &EncodeTrack) -> Task {
    let mut task = task_from_track(job, track);
    task.name = format!("{} packaging", job.name);
    task.task_type = TaskType::Packaging;
    task.output_asset = job.name.clone();
    task.packager = track.packager.clone();
    task
}
