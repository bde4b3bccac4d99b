use std::io::{BufRead, Write};

use tracing::{debug, info};

use crate::error::{HotspotError, Result};

use super::loader::ClipLoader;
use super::lock::StoreLock;
use super::protocol::WorkerRequest;

/// Serve jobs read from `input` until it is closed.
///
/// The first line must be a `configure` request. Every following `process`
/// request is answered with one report line on `output`.
pub fn serve<R: BufRead, W: Write>(input: R, mut output: W, lock: StoreLock) -> Result<()> {
    let mut lines = input.lines();

    let config = match lines.next() {
        None => return Ok(()),
        Some(line) => match serde_json::from_str::<WorkerRequest>(&line?)? {
            WorkerRequest::Configure { config } => *config,
            WorkerRequest::Process { .. } => {
                return Err(HotspotError::Worker(
                    "process request received before configure".into(),
                ))
            }
        },
    };
    debug!(lock = %lock.path().display(), "Worker configured");
    let loader = ClipLoader::new(config, lock);

    let mut served = 0usize;
    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<WorkerRequest>(&line)? {
            WorkerRequest::Process { path } => {
                let report = loader.process_file(&path);
                serde_json::to_writer(&mut output, &report)?;
                output.write_all(b"\n")?;
                output.flush()?;
                served += 1;
            }
            WorkerRequest::Configure { .. } => {
                return Err(HotspotError::Worker("worker configured twice".into()));
            }
        }
    }

    info!(jobs = served, "Worker finished");
    Ok(())
}
