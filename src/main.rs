// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "stream-sink")]
#[command(about = "Share one capture pipeline between many listeners")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a pipeline, attach listeners and drain its samples
    Run {
        /// JSON config file (defaults to a VP8 test pattern)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pipeline description (overrides the config)
        #[arg(short, long)]
        pipeline: Option<String>,

        /// Codec name, e.g. vp8, h264, opus (overrides the config)
        #[arg(long)]
        codec: Option<String>,

        /// Number of listeners to attach
        #[arg(short, long, default_value = "1")]
        listeners: usize,

        /// How long to consume samples, in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,

        /// Rewrite the pipeline framerate to this value
        #[arg(short, long)]
        framerate: Option<i16>,

        /// Use the in-memory engine instead of GStreamer
        #[arg(long)]
        dry_run: bool,
    },

    /// Print a description after the adaptive framerate rewrite
    Rewrite {
        /// Target framerate
        #[arg(short, long)]
        framerate: i16,

        /// Pipeline description
        description: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=stream_sink=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            pipeline,
            codec,
            listeners,
            duration,
            framerate,
            dry_run,
        } => cli::run(cli::RunOptions {
            config,
            pipeline,
            codec,
            listeners,
            duration,
            framerate,
            dry_run,
        }),
        Commands::Rewrite {
            framerate,
            description,
        } => {
            cli::rewrite(framerate, &description);
            Ok(())
        }
    }
}
