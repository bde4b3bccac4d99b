mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hotspot", about = "Thermal clip motion-track extraction")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show thermal clip header metadata
    Info(commands::info::InfoArgs),
    /// Extract tracks from every clip under a folder
    Extract(commands::extract::ExtractArgs),
    /// Print or save the default configuration
    Config(commands::config::ConfigArgs),
    /// Serve jobs from a scheduler over stdin/stdout
    #[command(hide = true)]
    Worker(commands::worker::WorkerArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    // stdout carries the job protocol in worker processes.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Extract(args) => commands::extract::run(args, cli.verbose),
        Commands::Config(args) => commands::config::run(args),
        Commands::Worker(args) => commands::worker::run(args),
    }
}
