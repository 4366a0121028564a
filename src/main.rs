mod cli;

use ladderforge::{
    authoring::AuthoringRegistry,
    config,
    engine::FfmpegEngine,
    probe::{FfprobeAdapter, MediaProbe},
    processor::TaskProcessor,
    splitter::{JobSplitter, SplitOutcome},
    store::{SqliteStore, WorkflowStore},
    worker::WorkerUnit,
};
use ladderforge_db::{models::Job, pool::init_pool, queries};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "ladderforge=trace,ladderforge_av=debug,ladderforge_db=debug,ladderforge_common=debug"
                .to_string()
        } else {
            "ladderforge=debug,ladderforge_av=info,ladderforge_db=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Run {
            input,
            output_dir,
            profile,
            name,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_job(
                &input,
                &output_dir,
                &profile,
                name,
                cli.config.as_deref(),
                true,
            ))
        }
        Commands::Split {
            input,
            output_dir,
            profile,
            name,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_job(
                &input,
                &output_dir,
                &profile,
                name,
                cli.config.as_deref(),
                false,
            ))
        }
        Commands::Probe { file, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(probe_file(&file, json, cli.config.as_deref()))
        }
        Commands::Profiles => list_profiles(),
        Commands::CheckTools => check_tools(),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("ladderforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Build the collaborators, create the job record, split it, and (for `run`)
/// execute the resulting tasks.
async fn run_job(
    input: &Path,
    output_dir: &Path,
    profile: &str,
    name: Option<String>,
    config_path: Option<&Path>,
    execute: bool,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if !input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }

    let db_path = shellexpand::tilde(&config.database.path).into_owned();
    let pool = init_pool(&db_path)?;
    let store: Arc<dyn WorkflowStore> = Arc::new(SqliteStore::new(pool.clone()));
    let registry = Arc::new(AuthoringRegistry::builtin());

    let ffprobe = ladderforge_av::get_tool_path("ffprobe", config.tools.ffprobe.as_deref())?;
    let prober: Arc<dyn MediaProbe> = Arc::new(FfprobeAdapter::new(ffprobe));

    let mut job = create_job(&pool, input, output_dir, profile, name)?;
    tracing::info!(job = %job.id, profile, "job submitted");

    let splitter = JobSplitter::new(registry, Arc::clone(&store), Arc::clone(&prober));
    match splitter.split(&mut job).await? {
        SplitOutcome::Rejected { reason } => {
            println!("Job {} rejected: {}", job.id, reason);
            return Ok(());
        }
        SplitOutcome::Split(report) => {
            println!(
                "Job {} split into {} task(s)",
                job.id,
                report.created.len()
            );
            for (task_name, err) in &report.failed {
                println!("  failed to persist {task_name}: {err}");
            }
        }
    }

    if execute {
        let ffmpeg = ladderforge_av::get_tool_path("ffmpeg", config.tools.ffmpeg.as_deref())?;
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create output dir {:?}", output_dir))?;

        let worker = WorkerUnit::new(prober, Arc::new(FfmpegEngine::new(ffmpeg)));
        let processor = TaskProcessor::new(
            Arc::clone(&store),
            worker,
            config.workers.max_concurrent,
        );
        processor.process_job(job.id).await?;
    }

    print_job_summary(&store, &job)?;
    Ok(())
}

fn create_job(
    pool: &ladderforge_db::DbPool,
    input: &Path,
    output_dir: &Path,
    profile: &str,
    name: Option<String>,
) -> Result<Job> {
    let input_folder = input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_string_lossy()
        .into_owned();
    let input_asset = input
        .file_name()
        .context("Input path has no file name")?
        .to_string_lossy()
        .into_owned();
    let name = name.unwrap_or_else(|| {
        input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| input_asset.clone())
    });

    let conn = ladderforge_db::get_conn(pool)?;
    let job = queries::jobs::create_job(
        &conn,
        &name,
        &input_folder,
        &input_asset,
        &output_dir.to_string_lossy(),
        // The declared output asset; the splitter derives per-track names.
        &input_asset,
        profile,
    )?;
    Ok(job)
}

fn print_job_summary(store: &Arc<dyn WorkflowStore>, job: &Job) -> Result<()> {
    let job = store.get_job(job.id)?;
    let tasks = store.tasks_for_job(job.id)?;

    println!("\nJob {} [{}] {}", job.id, job.status, job.name);
    if let Some(ref message) = job.status_message {
        println!("  {}", message);
    }
    for task in tasks {
        println!(
            "  {} [{}] {} -> {}",
            task.task_type, task.status, task.name, task.output_asset
        );
        if let Some(ref message) = task.status_message {
            println!("      {}", message);
        }
    }
    Ok(())
}

async fn probe_file(file: &Path, json: bool, config_path: Option<&Path>) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let ffprobe = ladderforge_av::get_tool_path("ffprobe", config.tools.ffprobe.as_deref())?;
    let streams = ladderforge_av::probe::probe_streams(&ffprobe, file).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&streams)?);
        return Ok(());
    }

    println!("File: {}", file.display());
    println!("Streams: {}", streams.len());
    for (i, stream) in streams.iter().enumerate() {
        print!(
            "  [{}] {}",
            i,
            stream.codec_type.as_deref().unwrap_or("unknown")
        );
        if let (Some(w), Some(h)) = (stream.width, stream.height) {
            print!(" {}x{}", w, h);
            if stream.is_vertical() {
                print!(" [vertical]");
            }
            if stream.is_rotated() {
                print!(" [rotated]");
            }
        }
        if let Some(duration) = stream.duration_secs() {
            print!(" {:.1}s", duration);
        }
        println!();
    }

    Ok(())
}

fn list_profiles() -> Result<()> {
    let registry = AuthoringRegistry::builtin();

    for key in registry.keys() {
        let spec = registry
            .resolve(key)
            .context("registry listed an unknown key")?;

        println!("{}", key);
        if let Some(ceiling) = spec.video_max_duration {
            println!("  max duration: {}s", ceiling);
        }
        for track in &spec.encoding_tracks {
            println!(
                "  encode  {} {} @ {}k, {} fps, audio {}",
                track.video_encoder,
                track.video_size,
                track.video_bitrate,
                track.video_fps,
                track.audio_encoder
            );
        }
        for track in &spec.packaging_tracks {
            println!(
                "  package {} {} @ {}k ({})",
                track.video_encoder,
                track.video_size,
                track.video_bitrate,
                track.packager.as_deref().unwrap_or("-")
            );
        }
    }

    Ok(())
}

fn check_tools() -> Result<()> {
    println!("Checking external tools...\n");

    let tools = ladderforge_av::check_tools();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable encoding.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Database: {}", config.database.path);
            println!("  Max concurrent workers: {}", config.workers.max_concurrent);
            println!(
                "  ffmpeg: {}",
                config
                    .tools
                    .ffmpeg
                    .as_deref()
                    .map(|p: &Path| p.display().to_string())
                    .unwrap_or_else(|| "(from PATH)".to_string())
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Database: {}", config.database.path);
            println!("  Max concurrent workers: {}", config.workers.max_concurrent);
        }
    }

    Ok(())
}
