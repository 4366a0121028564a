//! Job splitter integration tests.
//!
//! Exercises profile resolution, the duration gate, task generation, and
//! the per-track persistence independence guarantee against the in-memory
//! store.

mod common;

use std::sync::Arc;

use common::{audio_stream, video_stream, FailingStore, StubProbe, TestHarness};
use ladderforge::splitter::{JobSplitter, SplitOutcome};
use ladderforge_common::{TaskType, WorkflowStatus};

fn splitter_with(harness: &TestHarness, probe: Arc<common::StubProbe>) -> JobSplitter {
    JobSplitter::new(Arc::clone(&harness.registry), harness.store.clone(), probe)
}

// ---------------------------------------------------------------------------
// Unknown profile -> job error, zero tasks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_profile_fails_job_with_zero_tasks() {
    let harness = TestHarness::new();
    let mut job = harness.create_job("sb-av1-extreme");

    let splitter = splitter_with(&harness, StubProbe::with_streams(vec![]));
    let outcome = splitter.split(&mut job).await.unwrap();

    let SplitOutcome::Rejected { reason } = outcome else {
        panic!("expected rejection");
    };
    assert!(reason.contains("sb-av1-extreme"));

    // The failure is persisted and terminal: no tasks exist.
    let stored = harness.job(job.id);
    assert_eq!(stored.status, WorkflowStatus::Error);
    assert!(stored.status_message.unwrap().contains("sb-av1-extreme"));
    assert!(harness.tasks_for(job.id).is_empty());
}

// ---------------------------------------------------------------------------
// Duration gate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn over_ceiling_duration_rejects_job() {
    let harness = TestHarness::new();
    // sb-x264-medium carries a 31.0 s ceiling.
    let mut job = harness.create_job("sb-x264-medium");

    let probe = StubProbe::with_streams(vec![
        video_stream(1920, 1080, Some(40.0)),
        audio_stream(Some(40.0)),
    ]);
    let outcome = splitter_with(&harness, probe).split(&mut job).await.unwrap();

    assert!(matches!(outcome, SplitOutcome::Rejected { .. }));
    assert_eq!(harness.job(job.id).status, WorkflowStatus::Error);
    assert!(harness.tasks_for(job.id).is_empty());
}

#[tokio::test]
async fn duration_uses_max_across_video_and_audio_streams() {
    let harness = TestHarness::new();
    let mut job = harness.create_job("sb-x264-medium");

    // Video reports 20 s but audio runs 35 s; the max exceeds the ceiling.
    let probe = StubProbe::with_streams(vec![
        video_stream(1920, 1080, Some(20.0)),
        audio_stream(Some(35.0)),
    ]);
    let outcome = splitter_with(&harness, probe).split(&mut job).await.unwrap();

    assert!(matches!(outcome, SplitOutcome::Rejected { .. }));
    assert!(harness.tasks_for(job.id).is_empty());
}

#[tokio::test]
async fn missing_video_stream_rejects_job() {
    let harness = TestHarness::new();
    let mut job = harness.create_job("sb-x264-medium");

    let probe = StubProbe::with_streams(vec![audio_stream(Some(10.0))]);
    let outcome = splitter_with(&harness, probe).split(&mut job).await.unwrap();

    let SplitOutcome::Rejected { reason } = outcome else {
        panic!("expected rejection");
    };
    assert!(reason.contains("No video stream"));
    assert!(harness.tasks_for(job.id).is_empty());
}

#[tokio::test]
async fn unknown_duration_rejects_job() {
    let harness = TestHarness::new();
    let mut job = harness.create_job("sb-x264-medium");

    let probe = StubProbe::with_streams(vec![video_stream(1920, 1080, None), audio_stream(None)]);
    let outcome = splitter_with(&harness, probe).split(&mut job).await.unwrap();

    assert!(matches!(outcome, SplitOutcome::Rejected { .. }));
    assert!(harness.tasks_for(job.id).is_empty());
}

#[tokio::test]
async fn probe_failure_rejects_job_before_any_task() {
    let harness = TestHarness::new();
    let mut job = harness.create_job("sb-x264-medium");

    let outcome = splitter_with(&harness, StubProbe::failing())
        .split(&mut job)
        .await
        .unwrap();

    let SplitOutcome::Rejected { reason } = outcome else {
        panic!("expected rejection");
    };
    assert!(reason.contains("Probe failed"));
    assert_eq!(harness.job(job.id).status, WorkflowStatus::Error);
    assert!(harness.tasks_for(job.id).is_empty());
}

#[tokio::test]
async fn profiles_without_ceiling_skip_probing() {
    let harness = TestHarness::new();
    // sb-vp9-medium has no duration ceiling: a broken probe must not matter.
    let mut job = harness.create_job("sb-vp9-medium");

    let outcome = splitter_with(&harness, StubProbe::failing())
        .split(&mut job)
        .await
        .unwrap();

    let SplitOutcome::Split(report) = outcome else {
        panic!("expected split");
    };
    assert_eq!(report.created.len(), 4);
    assert!(report.failed.is_empty());
}

// ---------------------------------------------------------------------------
// Task generation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn valid_x264_job_generates_ladder_tasks() {
    let harness = TestHarness::new();
    let mut job = harness.create_job("sb-x264-medium");

    let probe = StubProbe::with_streams(vec![
        video_stream(1920, 1080, Some(20.0)),
        audio_stream(Some(20.0)),
    ]);
    let outcome = splitter_with(&harness, probe).split(&mut job).await.unwrap();

    let SplitOutcome::Split(report) = outcome else {
        panic!("expected split");
    };
    assert_eq!(report.created.len(), 2);

    let tasks = harness.tasks_for(job.id);
    assert_eq!(tasks.len(), 2);
    assert!(tasks.iter().all(|t| t.status == WorkflowStatus::New));
    assert!(tasks.iter().all(|t| t.task_type == TaskType::Encoding));
    assert!(tasks.iter().all(|t| t.job_id == job.id));

    let outputs: Vec<&str> = tasks.iter().map(|t| t.output_asset.as_str()).collect();
    assert!(outputs.contains(&"clip_960_540_900.mp4"));
    assert!(outputs.contains(&"clip_1280_720_2400.mp4"));

    // The 540p rung carries the screenshot flag, the 720p rung does not.
    let small = tasks.iter().find(|t| t.video_bitrate == 900).unwrap();
    let large = tasks.iter().find(|t| t.video_bitrate == 2400).unwrap();
    assert!(small.screenshots);
    assert!(!large.screenshots);
}

#[tokio::test]
async fn vp9_job_generates_three_encodes_and_one_packaging_task() {
    let harness = TestHarness::new();
    let mut job = harness.create_job("sb-vp9-medium");

    let probe = StubProbe::with_streams(vec![video_stream(1920, 1080, Some(60.0))]);
    let outcome = splitter_with(&harness, probe).split(&mut job).await.unwrap();

    let SplitOutcome::Split(report) = outcome else {
        panic!("expected split");
    };
    assert_eq!(report.created.len(), 4);

    let tasks = harness.tasks_for(job.id);
    let encodes: Vec<_> = tasks
        .iter()
        .filter(|t| t.task_type == TaskType::Encoding)
        .collect();
    let packages: Vec<_> = tasks
        .iter()
        .filter(|t| t.task_type == TaskType::Packaging)
        .collect();

    assert_eq!(encodes.len(), 3);
    assert_eq!(packages.len(), 1);
    assert!(tasks.iter().all(|t| t.status == WorkflowStatus::New));

    let mut rungs: Vec<(String, u32)> = encodes
        .iter()
        .map(|t| (t.video_size.to_string(), t.video_bitrate))
        .collect();
    rungs.sort_by_key(|(_, bitrate)| *bitrate);
    assert_eq!(
        rungs,
        vec![
            ("768x432".to_string(), 300),
            ("960x540".to_string(), 900),
            ("1280x720".to_string(), 2400),
        ]
    );

    // VP9 encodes land in webm; the packaging task keeps the bare job name.
    assert!(encodes.iter().all(|t| t.output_asset.ends_with(".webm")));
    assert_eq!(packages[0].output_asset, "clip");
    assert_eq!(packages[0].packager.as_deref(), Some("mpd"));
}

#[tokio::test]
async fn output_assets_are_pairwise_distinct() {
    let harness = TestHarness::new();
    let mut job = harness.create_job("sb-vp9-medium");

    let probe = StubProbe::with_streams(vec![video_stream(1280, 720, Some(60.0))]);
    splitter_with(&harness, probe).split(&mut job).await.unwrap();

    let tasks = harness.tasks_for(job.id);
    let mut outputs: Vec<String> = tasks.iter().map(|t| t.output_asset.clone()).collect();
    let total = outputs.len();
    outputs.sort();
    outputs.dedup();
    assert_eq!(outputs.len(), total);
}

// ---------------------------------------------------------------------------
// Per-track persistence independence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn one_failing_insert_does_not_suppress_sibling_tracks() {
    let harness = TestHarness::new();
    let mut job = harness.create_job("sb-vp9-medium");

    // The middle rung's insert fails; everything else must still land.
    let store = FailingStore::new(Arc::clone(&harness.store), "clip_960_540_900.webm");
    let splitter = JobSplitter::new(
        Arc::clone(&harness.registry),
        store,
        StubProbe::with_streams(vec![video_stream(1280, 720, Some(60.0))]),
    );

    let SplitOutcome::Split(report) = splitter.split(&mut job).await.unwrap() else {
        panic!("expected split");
    };

    assert_eq!(report.created.len(), 3);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].1.to_string().contains("simulated"));

    let stored: Vec<String> = harness
        .tasks_for(job.id)
        .iter()
        .map(|t| t.output_asset.clone())
        .collect();
    assert_eq!(stored.len(), 3);
    assert!(stored.contains(&"clip_768_432_300.webm".to_string()));
    assert!(stored.contains(&"clip_1280_720_2400.webm".to_string()));
    assert!(stored.contains(&"clip".to_string()));
    assert!(!stored.contains(&"clip_960_540_900.webm".to_string()));
}
