//! JSON-lines messages exchanged with worker processes.
//!
//! The scheduler writes one [`WorkerRequest`] per line to a worker's stdin:
//! a `configure` request first, then one `process` request per job. The
//! worker answers every `process` request with exactly one [`JobReport`]
//! line on stdout.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::pipeline::config::Config;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerRequest {
    Configure { config: Box<Config> },
    Process { path: PathBuf },
}

/// Why a file produced no tracks without being a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingMetadata,
    InvalidMetadata,
    NoValidTracks,
    DecodeFailure,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingMetadata => write!(f, "missing metadata"),
            Self::InvalidMetadata => write!(f, "invalid metadata"),
            Self::NoValidTracks => write!(f, "no valid tracks"),
            Self::DecodeFailure => write!(f, "decode failure"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Processed { tracks: usize, frames: usize },
    Skipped(SkipReason),
    Failed(String),
    /// The shared lock could not be used; the whole pool must stop.
    Fatal(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobReport {
    pub path: PathBuf,
    pub status: JobStatus,
    pub elapsed_ms: u64,
}
