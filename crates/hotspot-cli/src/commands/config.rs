use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use hotspot_core::pipeline::config::Config;

#[derive(Args)]
pub struct ConfigArgs {
    /// Validate an existing run config instead of printing the defaults
    #[arg(long, conflicts_with = "output")]
    pub check: Option<PathBuf>,

    /// Save the default run config to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &ConfigArgs) -> Result<()> {
    if let Some(ref path) = args.check {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&text)
            .with_context(|| format!("Invalid run config {}", path.display()))?;
        println!(
            "{} is valid: {} -> {} ({} workers, {} background)",
            path.display(),
            config.source_folder.display(),
            config.tracks_folder.display(),
            config.worker_count,
            config.tracking.background_calc
        );
        return Ok(());
    }

    let defaults = toml::to_string_pretty(&Config::default())?;
    match args.output {
        Some(ref path) => {
            std::fs::write(path, &defaults)
                .with_context(|| format!("Failed to write config to {}", path.display()))?;
            println!("Default run config saved to {}", path.display());
        }
        None => print!("{defaults}"),
    }
    Ok(())
}
