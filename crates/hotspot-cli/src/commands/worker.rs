use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use hotspot_core::consts::DEFAULT_THREADS_PER_WORKER;
use hotspot_core::scheduler::{serve, StoreLock};

#[derive(Args)]
pub struct WorkerArgs {
    /// Store lock file shared with the scheduler
    #[arg(long)]
    pub lock: PathBuf,

    /// Rayon threads for this worker
    #[arg(long, default_value_t = DEFAULT_THREADS_PER_WORKER)]
    pub threads: usize,
}

pub fn run(args: &WorkerArgs) -> Result<()> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads.max(1))
        .build_global()
        .context("Failed to size worker thread pool")?;

    let lock = StoreLock::open(&args.lock)
        .with_context(|| format!("Failed to open store lock {}", args.lock.display()))?;

    let stdin = io::stdin().lock();
    let stdout = BufWriter::new(io::stdout().lock());
    serve(stdin, stdout, lock).context("Worker protocol error")?;
    Ok(())
}
