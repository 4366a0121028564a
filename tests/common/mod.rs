//! Shared test harness: in-memory store plus scripted probe/engine fakes.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ladderforge::engine::{EncodeEngine, ProgressFn};
use ladderforge::probe::MediaProbe;
use ladderforge::store::{SqliteStore, WorkflowStore};
use ladderforge::authoring::AuthoringRegistry;
use ladderforge_av::probe::{StreamInfo, StreamTags};
use ladderforge_av::EncodeParams;
use ladderforge_common::{EncoderFamily, JobId, Result, TaskId, VideoSize, WorkflowStatus};
use ladderforge_db::models::{Job, Task};
use ladderforge_db::pool::{init_memory_pool, DbPool, PooledConnection};
use ladderforge_db::queries;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// In-memory database plus the collaborators most tests need.
pub struct TestHarness {
    pub pool: DbPool,
    pub store: Arc<SqliteStore>,
    pub registry: Arc<AuthoringRegistry>,
}

impl TestHarness {
    pub fn new() -> Self {
        let pool = init_memory_pool().unwrap();
        let store = Arc::new(SqliteStore::new(pool.clone()));
        let registry = Arc::new(AuthoringRegistry::builtin());
        Self {
            pool,
            store,
            registry,
        }
    }

    pub fn conn(&self) -> PooledConnection {
        self.pool.get().unwrap()
    }

    /// Create a job record named "clip" against the given profile.
    pub fn create_job(&self, profile: &str) -> Job {
        queries::jobs::create_job(
            &self.conn(),
            "clip",
            "/in",
            "clip.mov",
            "/out",
            "clip.mp4",
            profile,
        )
        .unwrap()
    }

    pub fn tasks_for(&self, job_id: JobId) -> Vec<Task> {
        queries::tasks::list_tasks_for_job(&self.conn(), job_id).unwrap()
    }

    pub fn job(&self, job_id: JobId) -> Job {
        queries::jobs::get_job(&self.conn(), job_id).unwrap()
    }
}

// ---------------------------------------------------------------------------
// Stream builders
// ---------------------------------------------------------------------------

pub fn video_stream(width: u32, height: u32, duration: Option<f64>) -> StreamInfo {
    StreamInfo {
        codec_type: Some("video".to_string()),
        width: Some(width),
        height: Some(height),
        duration: duration.map(|d| d.to_string()),
        tags: StreamTags::default(),
    }
}

pub fn rotated_video_stream(width: u32, height: u32, rotate: &str) -> StreamInfo {
    let mut stream = video_stream(width, height, Some(10.0));
    stream.tags.rotate = Some(rotate.to_string());
    stream
}

pub fn audio_stream(duration: Option<f64>) -> StreamInfo {
    StreamInfo {
        codec_type: Some("audio".to_string()),
        width: None,
        height: None,
        duration: duration.map(|d| d.to_string()),
        tags: StreamTags::default(),
    }
}

// ---------------------------------------------------------------------------
// Scripted probe
// ---------------------------------------------------------------------------

pub enum ProbeScript {
    Streams(Vec<StreamInfo>),
    Fail,
}

pub struct StubProbe {
    script: ProbeScript,
}

impl StubProbe {
    pub fn with_streams(streams: Vec<StreamInfo>) -> Arc<Self> {
        Arc::new(Self {
            script: ProbeScript::Streams(streams),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            script: ProbeScript::Fail,
        })
    }
}

#[async_trait]
impl MediaProbe for StubProbe {
    async fn streams(&self, _path: &Path) -> ladderforge_av::Result<Vec<StreamInfo>> {
        match &self.script {
            ProbeScript::Streams(streams) => Ok(streams.clone()),
            ProbeScript::Fail => Err(ladderforge_av::Error::tool_failed(
                "ffprobe",
                "simulated probe failure",
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Scripted engine
// ---------------------------------------------------------------------------

pub enum EngineScript {
    /// Report the given percentages, then succeed.
    Succeed { progress: Vec<f64> },
    /// Fail immediately with this reason.
    Fail { message: String },
    /// Block until the cancellation token fires, then report cancellation.
    WaitForStop,
}

#[derive(Debug, Clone)]
pub struct EncodeCall {
    pub input: PathBuf,
    pub output: PathBuf,
    pub size: VideoSize,
    pub family: EncoderFamily,
}

#[derive(Debug, Clone)]
pub struct ScreenshotCall {
    pub base_name: String,
    pub size: VideoSize,
    pub count: u32,
}

pub struct ScriptedEngine {
    script: EngineScript,
    pub fail_screenshots: bool,
    pub encode_calls: Mutex<Vec<EncodeCall>>,
    pub screenshot_calls: Mutex<Vec<ScreenshotCall>>,
}

impl ScriptedEngine {
    pub fn succeeding(progress: Vec<f64>) -> Arc<Self> {
        Arc::new(Self {
            script: EngineScript::Succeed { progress },
            fail_screenshots: false,
            encode_calls: Mutex::new(Vec::new()),
            screenshot_calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            script: EngineScript::Fail {
                message: message.to_string(),
            },
            fail_screenshots: false,
            encode_calls: Mutex::new(Vec::new()),
            screenshot_calls: Mutex::new(Vec::new()),
        })
    }

    pub fn waiting_for_stop() -> Arc<Self> {
        Arc::new(Self {
            script: EngineScript::WaitForStop,
            fail_screenshots: false,
            encode_calls: Mutex::new(Vec::new()),
            screenshot_calls: Mutex::new(Vec::new()),
        })
    }

    pub fn with_failing_screenshots(progress: Vec<f64>) -> Arc<Self> {
        Arc::new(Self {
            script: EngineScript::Succeed { progress },
            fail_screenshots: true,
            encode_calls: Mutex::new(Vec::new()),
            screenshot_calls: Mutex::new(Vec::new()),
        })
    }

    pub fn encode_count(&self) -> usize {
        self.encode_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl EncodeEngine for ScriptedEngine {
    async fn encode(
        &self,
        input: &Path,
        output: &Path,
        params: &EncodeParams,
        family: EncoderFamily,
        _duration_secs: Option<f64>,
        mut on_progress: ProgressFn,
        cancel: &CancellationToken,
    ) -> ladderforge_av::Result<()> {
        self.encode_calls.lock().unwrap().push(EncodeCall {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            size: params.video_size,
            family,
        });

        match &self.script {
            EngineScript::Succeed { progress } => {
                for pct in progress {
                    on_progress(*pct);
                }
                Ok(())
            }
            EngineScript::Fail { message } => {
                Err(ladderforge_av::Error::tool_failed("ffmpeg", message.clone()))
            }
            EngineScript::WaitForStop => {
                cancel.cancelled().await;
                Err(ladderforge_av::Error::Cancelled("ffmpeg".to_string()))
            }
        }
    }

    async fn screenshots(
        &self,
        _input: &Path,
        _output_folder: &Path,
        count: u32,
        base_name: &str,
        size: VideoSize,
        _duration_secs: Option<f64>,
    ) -> ladderforge_av::Result<()> {
        self.screenshot_calls.lock().unwrap().push(ScreenshotCall {
            base_name: base_name.to_string(),
            size,
            count,
        });

        if self.fail_screenshots {
            Err(ladderforge_av::Error::tool_failed(
                "ffmpeg",
                "simulated screenshot failure",
            ))
        } else {
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Store wrapper that fails specific task inserts
// ---------------------------------------------------------------------------

/// Delegates to a real store but rejects `add_task` for one output asset, to
/// prove sibling tracks are unaffected by a single failing insert.
pub struct FailingStore {
    inner: Arc<SqliteStore>,
    fail_output_asset: String,
}

impl FailingStore {
    pub fn new(inner: Arc<SqliteStore>, fail_output_asset: &str) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_output_asset: fail_output_asset.to_string(),
        })
    }
}

impl WorkflowStore for FailingStore {
    fn add_task(&self, task: &Task) -> Result<()> {
        if task.output_asset == self.fail_output_asset {
            return Err(ladderforge_common::Error::database(
                "simulated store failure",
            ));
        }
        self.inner.add_task(task)
    }

    fn update_job(&self, job: &Job) -> Result<()> {
        self.inner.update_job(job)
    }

    fn update_task_status(
        &self,
        id: TaskId,
        status: WorkflowStatus,
        message: Option<&str>,
    ) -> Result<()> {
        self.inner.update_task_status(id, status, message)
    }

    fn get_job(&self, id: JobId) -> Result<Job> {
        self.inner.get_job(id)
    }

    fn tasks_for_job(&self, job_id: JobId) -> Result<Vec<Task>> {
        self.inner.tasks_for_job(job_id)
    }
}
