// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "photobooth")]
#[command(about = "Webcam photobooth with countdown sessions and cosmetic filters")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Config file (default: ~/.config/photobooth/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Run a capture session and export the photos
    Shoot(cli::ShootArgs),

    /// Apply a style and skin smoothing to an image file
    Filter {
        /// Input image
        input: PathBuf,

        /// Output image (.jpg or .png)
        output: PathBuf,

        /// Cosmetic style
        #[arg(short, long, default_value = "none")]
        style: String,

        /// Skin smoothing level (0-100)
        #[arg(long, default_value = "0")]
        smoothing: u8,
    },

    /// List styles with their preview filters
    Styles,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=photobooth=debug, RUST_LOG=info
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
        Commands::List => cli::list_cameras(),
        Commands::Shoot(args) => cli::shoot(cli.config.as_deref(), args),
        Commands::Filter {
            input,
            output,
            style,
            smoothing,
        } => cli::filter_image(&input, &output, &style, smoothing),
        Commands::Styles => cli::list_styles(),
    }
}
