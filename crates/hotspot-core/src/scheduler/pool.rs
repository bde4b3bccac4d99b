use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{HotspotError, Result};
use crate::pipeline::config::Config;
use crate::pipeline::{NoOpReporter, ProgressReporter};

use super::discover::discover_sources;
use super::loader::ClipLoader;
use super::lock::StoreLock;
use super::protocol::{JobReport, JobStatus, WorkerRequest};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How to launch a worker process. `--lock <path>` is appended.
#[derive(Clone, Debug)]
pub struct WorkerCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

/// Reports of every job that ran, ordered by source path.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<JobReport>,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.count(|s| matches!(s, JobStatus::Processed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, JobStatus::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, JobStatus::Failed(_) | JobStatus::Fatal(_)))
    }

    pub fn tracks(&self) -> usize {
        self.reports
            .iter()
            .map(|r| match r.status {
                JobStatus::Processed { tracks, .. } => tracks,
                _ => 0,
            })
            .sum()
    }

    fn count(&self, pred: impl Fn(&JobStatus) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.status)).count()
    }
}

/// Runs the per-file pipeline over a batch, inline or across worker
/// processes, with one shared store lock.
pub struct JobScheduler {
    config: Config,
    worker: Option<WorkerCommand>,
    cancel: Arc<AtomicBool>,
    reporter: Arc<dyn ProgressReporter>,
}

enum PoolEvent {
    Report(JobReport),
    SpawnFailed(String),
}

impl JobScheduler {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            worker: None,
            cancel: Arc::new(AtomicBool::new(false)),
            reporter: Arc::new(NoOpReporter),
        }
    }

    pub fn with_worker_command(mut self, command: WorkerCommand) -> Self {
        self.worker = Some(command);
        self
    }

    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Discover sources under the configured folder and process them.
    pub fn run(&self) -> Result<RunSummary> {
        let files = discover_sources(
            &self.config.source_folder,
            &self.config.load.source_extension,
        )?;
        self.run_files(files)
    }

    pub fn run_files(&self, files: Vec<PathBuf>) -> Result<RunSummary> {
        std::fs::create_dir_all(&self.config.tracks_folder)?;
        let lock = StoreLock::open(&self.config.lock_path())?;

        info!(
            files = files.len(),
            workers = self.config.worker_count,
            source = %self.config.source_folder.display(),
            "Processing clips"
        );
        self.reporter.begin(files.len());

        let result = match &self.worker {
            Some(command) if self.config.worker_count > 0 => {
                self.run_pool(files, &lock, command, self.config.worker_count)
            }
            _ => {
                if self.config.worker_count > 0 {
                    warn!("No worker command available, processing inline");
                }
                self.run_inline(files, lock)
            }
        };
        self.reporter.finish();

        let mut summary = result?;
        summary.reports.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(summary)
    }

    fn run_inline(&self, files: Vec<PathBuf>, lock: StoreLock) -> Result<RunSummary> {
        let loader = ClipLoader::new(self.config.clone(), lock);
        let mut reports = Vec::with_capacity(files.len());
        for path in files {
            if self.cancel.load(Ordering::SeqCst) {
                warn!("Interrupted, stopping before remaining jobs");
                return Err(HotspotError::Interrupted);
            }
            let report = loader.process_file(&path);
            self.reporter.job_finished(&report);
            if let JobStatus::Fatal(message) = &report.status {
                return Err(HotspotError::Lock(message.clone()));
            }
            reports.push(report);
        }
        Ok(RunSummary { reports })
    }

    fn run_pool(
        &self,
        files: Vec<PathBuf>,
        lock: &StoreLock,
        command: &WorkerCommand,
        worker_count: usize,
    ) -> Result<RunSummary> {
        let slots = worker_count.min(files.len());
        if slots == 0 {
            return Ok(RunSummary::default());
        }

        let configure = serde_json::to_string(&WorkerRequest::Configure {
            config: Box::new(self.config.clone()),
        })?;
        let queue = Arc::new(Mutex::new(VecDeque::from(files)));
        let stop = Arc::new(AtomicBool::new(false));
        let children: Arc<Mutex<Vec<Option<Child>>>> =
            Arc::new(Mutex::new((0..slots).map(|_| None).collect()));
        let (tx, rx) = mpsc::channel();

        let handles: Vec<_> = (0..slots)
            .map(|slot| {
                let worker = SlotWorker {
                    slot,
                    command: command.clone(),
                    lock_path: lock.path().to_path_buf(),
                    configure: configure.clone(),
                    queue: Arc::clone(&queue),
                    stop: Arc::clone(&stop),
                    cancel: Arc::clone(&self.cancel),
                    children: Arc::clone(&children),
                    events: tx.clone(),
                };
                thread::spawn(move || worker.run())
            })
            .collect();
        drop(tx);

        let mut reports = Vec::new();
        let outcome = loop {
            if self.cancel.load(Ordering::SeqCst) {
                warn!("Interrupted, terminating workers");
                break Err(HotspotError::Interrupted);
            }
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(PoolEvent::Report(report)) => {
                    self.reporter.job_finished(&report);
                    if let JobStatus::Fatal(message) = &report.status {
                        break Err(HotspotError::Lock(message.clone()));
                    }
                    reports.push(report);
                }
                Ok(PoolEvent::SpawnFailed(message)) => break Err(HotspotError::Worker(message)),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break Ok(()),
            }
        };

        if outcome.is_err() {
            stop.store(true, Ordering::SeqCst);
            kill_all(&children);
        }
        for handle in handles {
            let _ = handle.join();
        }

        outcome.map(|()| RunSummary { reports })
    }
}

fn kill_all(children: &Mutex<Vec<Option<Child>>>) {
    if let Ok(mut children) = children.lock() {
        for child in children.iter_mut().flatten() {
            let _ = child.kill();
        }
    }
}

/// One pool slot: keeps a worker process alive and feeds it jobs.
struct SlotWorker {
    slot: usize,
    command: WorkerCommand,
    lock_path: PathBuf,
    configure: String,
    queue: Arc<Mutex<VecDeque<PathBuf>>>,
    stop: Arc<AtomicBool>,
    cancel: Arc<AtomicBool>,
    children: Arc<Mutex<Vec<Option<Child>>>>,
    events: Sender<PoolEvent>,
}

struct WorkerPipes {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl WorkerPipes {
    fn run_job(&mut self, path: &Path) -> Result<JobReport> {
        let request = serde_json::to_string(&WorkerRequest::Process {
            path: path.to_path_buf(),
        })?;
        writeln!(self.stdin, "{request}")?;
        self.stdin.flush()?;

        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(HotspotError::Worker("worker closed its output".into()));
        }
        Ok(serde_json::from_str(&line)?)
    }
}

impl SlotWorker {
    fn stopping(&self) -> bool {
        self.stop.load(Ordering::SeqCst) || self.cancel.load(Ordering::SeqCst)
    }

    fn run(self) {
        let mut pipes: Option<WorkerPipes> = None;
        loop {
            if self.stopping() {
                break;
            }
            let next = match self.queue.lock() {
                Ok(mut queue) => queue.pop_front(),
                Err(_) => None,
            };
            let Some(path) = next else { break };

            if pipes.is_none() {
                match self.spawn() {
                    Ok(p) => pipes = Some(p),
                    Err(e) => {
                        let _ = self.events.send(PoolEvent::SpawnFailed(e.to_string()));
                        break;
                    }
                }
            }
            // An interrupt may land while the child starts, before
            // `kill_all` can see it.
            if self.stopping() {
                break;
            }
            let Some(worker) = pipes.as_mut() else { break };

            match worker.run_job(&path) {
                Ok(report) => {
                    let _ = self.events.send(PoolEvent::Report(report));
                }
                Err(e) => {
                    if self.stopping() {
                        break;
                    }
                    warn!(
                        slot = self.slot,
                        file = %path.display(),
                        error = %e,
                        "Worker died mid-job, respawning"
                    );
                    let _ = self.events.send(PoolEvent::Report(JobReport {
                        path,
                        status: JobStatus::Failed(format!("worker exited: {e}")),
                        elapsed_ms: 0,
                    }));
                    pipes = None;
                    self.reap(true);
                }
            }
        }

        // Closing stdin lets an idle worker exit on its own.
        drop(pipes);
        self.reap(self.stopping());
    }

    fn spawn(&self) -> Result<WorkerPipes> {
        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .arg("--lock")
            .arg(&self.lock_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                HotspotError::Worker(format!(
                    "cannot start {}: {e}",
                    self.command.program.display()
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| HotspotError::Worker("worker stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| HotspotError::Worker("worker stdout unavailable".into()))?;
        let mut pipes = WorkerPipes {
            stdin,
            stdout: BufReader::new(stdout),
        };

        debug!(slot = self.slot, pid = child.id(), "Worker started");
        if let Ok(mut children) = self.children.lock() {
            children[self.slot] = Some(child);
        }

        writeln!(pipes.stdin, "{}", self.configure)?;
        pipes.stdin.flush()?;
        Ok(pipes)
    }

    fn reap(&self, kill: bool) {
        let child = match self.children.lock() {
            Ok(mut children) => children[self.slot].take(),
            Err(_) => None,
        };
        if let Some(mut child) = child {
            if kill {
                let _ = child.kill();
            }
            let _ = child.wait();
        }
    }
}
