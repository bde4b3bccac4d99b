use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use hotspot_core::error::HotspotError;
use hotspot_core::pipeline::config::Config;
use hotspot_core::pipeline::ProgressReporter;
use hotspot_core::scheduler::{JobReport, JobScheduler, JobStatus, WorkerCommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use crate::summary::print_run_summary;

/// Exit status after an operator interrupt (128 + SIGINT).
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Args)]
pub struct ExtractArgs {
    /// Run config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Folder searched recursively for clips
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Folder receiving the track store and previews
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Worker processes (0 processes inline)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Write a PNG preview per clip
    #[arg(long)]
    pub preview: bool,
}

struct BarReporter {
    bar: ProgressBar,
}

impl ProgressReporter for BarReporter {
    fn begin(&self, total_jobs: usize) {
        self.bar.set_length(total_jobs as u64);
    }

    fn job_finished(&self, report: &JobReport) {
        let name = report
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let outcome = match &report.status {
            JobStatus::Processed { tracks, .. } => format!("{tracks} tracks"),
            JobStatus::Skipped(reason) => format!("skipped ({reason})"),
            JobStatus::Failed(_) | JobStatus::Fatal(_) => "failed".to_string(),
        };
        self.bar.set_message(format!("{name}: {outcome}"));
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.finish_with_message("Done");
    }
}

pub fn run(args: &ExtractArgs, verbose: bool) -> Result<()> {
    let config = load_config(args)?;

    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst))
        .context("Failed to install interrupt handler")?;

    let mut worker_args = Vec::new();
    if verbose {
        worker_args.push("--verbose".to_string());
    }
    worker_args.extend([
        "worker".to_string(),
        "--threads".to_string(),
        config.threads_per_worker.to_string(),
    ]);
    let worker = WorkerCommand {
        program: std::env::current_exe().context("Cannot locate hotspot executable")?,
        args: worker_args,
    };

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg:40} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );

    let scheduler = JobScheduler::new(config.clone())
        .with_worker_command(worker)
        .with_cancel_flag(cancel)
        .with_reporter(Arc::new(BarReporter { bar }));

    match scheduler.run() {
        Ok(summary) => {
            print_run_summary(&config, &summary);
            Ok(())
        }
        Err(HotspotError::Interrupted) => {
            warn!("Interrupted by operator");
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
        Err(e) => Err(e).context("Track extraction aborted"),
    }
}

fn load_config(args: &ExtractArgs) -> Result<Config> {
    let mut config: Config = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str(&contents).context("Invalid run config")?
    } else {
        Config::default()
    };

    if let Some(ref source) = args.source {
        config.source_folder = source.clone();
    }
    if let Some(ref output) = args.output {
        config.tracks_folder = output.clone();
    }
    if let Some(workers) = args.workers {
        config.worker_count = workers;
    }
    if args.preview {
        config.load.preview = true;
    }
    Ok(config)
}
