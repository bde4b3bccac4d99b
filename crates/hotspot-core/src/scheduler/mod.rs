//! Batch processing: discovery, per-file jobs, the worker pool and the
//! shared store lock.

pub mod discover;
pub mod loader;
pub mod lock;
pub mod pool;
pub mod protocol;
pub mod shard;
pub mod worker;

pub use discover::discover_sources;
pub use loader::ClipLoader;
pub use lock::{StoreLock, StoreLockGuard};
pub use pool::{JobScheduler, RunSummary, WorkerCommand};
pub use protocol::{JobReport, JobStatus, SkipReason, WorkerRequest};
pub use shard::distributed_folder;
pub use worker::serve;
