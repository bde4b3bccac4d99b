use crate::scheduler::protocol::JobReport;

/// Thread-safe progress reporting for a batch run.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// The batch is starting with `total_jobs` files.
    fn begin(&self, _total_jobs: usize) {}

    /// One file has been handled, successfully or not.
    fn job_finished(&self, _report: &JobReport) {}

    /// No further reports will arrive.
    fn finish(&self) {}
}

/// No-op progress reporter.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
