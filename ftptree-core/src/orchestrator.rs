// Orchestrator: one isolated worker process per site, polled on a
// fixed interval until every worker reaches a terminal state. Failed
// sites are never retried here; that is the operator's call.

use crate::error::{CoreError, Result};
use crate::sites::Site;
use std::path::Path;
use std::process::ExitStatus;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::interval;
use tracing::{debug, info, warn};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Running,
    Succeeded,
    Failed,
}

impl WorkerStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkerStatus::Running)
    }

    /// A zero exit is success; any other exit, including death by
    /// signal, is failure.
    fn classify(status: ExitStatus) -> Self {
        if status.success() {
            WorkerStatus::Succeeded
        } else {
            WorkerStatus::Failed
        }
    }
}

/// Orchestrator-side handle to one crawl worker process.
pub struct WorkerHandle {
    site_id: String,
    child: Child,
    status: WorkerStatus,
}

impl WorkerHandle {
    /// Spawn one crawl worker process for a site. `program` is the
    /// ftptree binary itself; the worker runs its `crawl` subcommand.
    pub fn spawn(program: &Path, site: &Site) -> Result<Self> {
        let child = Command::new(program)
            .arg("--quiet")
            .arg("crawl")
            .arg("--host")
            .arg(&site.host)
            .arg("--root")
            .arg(&site.root)
            .arg("--method")
            .arg(site.method.to_string())
            .arg("--output")
            .arg(&site.output)
            .spawn()
            .map_err(|e| CoreError::Spawn(site.id.clone(), e))?;
        info!("spawned worker for {}", site.id);
        Ok(Self {
            site_id: site.id.clone(),
            child,
            status: WorkerStatus::Running,
        })
    }

    /// Wrap an already-spawned child process. This is how tests
    /// supervise arbitrary commands in place of real workers.
    pub fn from_child(site_id: impl Into<String>, child: Child) -> Self {
        Self {
            site_id: site_id.into(),
            child,
            status: WorkerStatus::Running,
        }
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn status(&self) -> WorkerStatus {
        self.status
    }

    /// Non-blocking status check; logs the transition the first time
    /// a terminal state is observed.
    pub fn poll(&mut self) -> WorkerStatus {
        if self.status.is_terminal() {
            return self.status;
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.status = WorkerStatus::classify(status);
                match self.status {
                    WorkerStatus::Succeeded => info!("worker {} succeeded", self.site_id),
                    WorkerStatus::Failed => warn!("worker {} failed ({})", self.site_id, status),
                    WorkerStatus::Running => unreachable!(),
                }
            }
            Ok(None) => {
                debug!("worker {} still crawling", self.site_id);
            }
            Err(e) => {
                warn!("worker {} failed (could not poll: {})", self.site_id, e);
                self.status = WorkerStatus::Failed;
            }
        }
        self.status
    }

    /// Forcibly terminate the worker. Non-graceful: no partial tree is
    /// persisted.
    pub async fn kill(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        match self.child.kill().await {
            Ok(()) => info!("killed worker {}", self.site_id),
            Err(e) => warn!("could not kill worker {}: {}", self.site_id, e),
        }
        self.status = WorkerStatus::Failed;
    }
}

pub struct Orchestrator {
    workers: Vec<WorkerHandle>,
    poll_interval: Duration,
}

impl Orchestrator {
    pub fn new(workers: Vec<WorkerHandle>) -> Self {
        Self {
            workers,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Spawn one worker per site, in registry order.
    pub fn spawn_all(program: &Path, sites: &[Site]) -> Result<Self> {
        let workers = sites
            .iter()
            .map(|site| WorkerHandle::spawn(program, site))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(workers))
    }

    pub fn workers(&self) -> &[WorkerHandle] {
        &self.workers
    }

    /// Poll every worker once. Returns true when all are terminal.
    pub fn poll_workers(&mut self) -> bool {
        let mut all_terminal = true;
        for worker in &mut self.workers {
            if !worker.poll().is_terminal() {
                all_terminal = false;
            }
        }
        all_terminal
    }

    /// Supervise until every worker is terminal or the operator
    /// interrupts. On interrupt every still-running worker is killed
    /// outright, then the loop ends.
    pub async fn supervise(&mut self) {
        let mut ticker = interval(self.poll_interval);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.poll_workers() {
                        info!("all workers finished");
                        break;
                    }
                }
                _ = &mut ctrl_c => {
                    info!("interrupt received; killing workers");
                    self.kill_all().await;
                    break;
                }
            }
        }
    }

    pub async fn kill_all(&mut self) {
        for worker in &mut self.workers {
            worker.kill().await;
        }
    }
}
