use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ladderforge")]
#[command(author, version, about = "Ladder-driven media transcoding orchestrator")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit a job, split it into tasks, and run them to completion
    Run {
        /// Input media file
        #[arg(required = true)]
        input: PathBuf,

        /// Directory the encoded outputs are written to
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Authoring profile key (see `profiles`)
        #[arg(short, long)]
        profile: String,

        /// Job name; defaults to the input file stem
        #[arg(long)]
        name: Option<String>,
    },

    /// Submit a job and split it into tasks without executing them
    Split {
        /// Input media file
        #[arg(required = true)]
        input: PathBuf,

        /// Directory the encoded outputs would be written to
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Authoring profile key (see `profiles`)
        #[arg(short, long)]
        profile: String,

        /// Job name; defaults to the input file stem
        #[arg(long)]
        name: Option<String>,
    },

    /// Probe a media file and display its streams
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the registered authoring profiles
    Profiles,

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
