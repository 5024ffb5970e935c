//! Shared state for background customer-import jobs.
//!
//! Import validation and insertion run outside the request/response cycle;
//! the upload endpoint returns a job id and the client polls
//! `/api/customers/import/status/{job_id}`. Workers report progress through
//! an MPSC channel consumed by [`start_job_updater`], which owns all writes
//! to the shared map.

use std::collections::HashMap;
use std::sync::Arc;

use common::jobs::JobStatus;
use tokio::sync::{mpsc, RwLock};

/// Thread-safe container for the status of all import jobs, shared with the
/// handlers as `web::Data`.
#[derive(Clone)]
pub struct ImportJobs {
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,
    pub tx: mpsc::Sender<JobUpdate>,
}

/// Status change reported by a background worker.
#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

impl JobUpdate {
    pub fn new(job_id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            job_id: job_id.into(),
            status,
        }
    }
}

impl ImportJobs {
    /// Create the shared state plus the receiver half for the updater task.
    pub fn new() -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(100);
        (
            Self {
                jobs: Arc::new(RwLock::new(HashMap::new())),
                tx,
            },
            rx,
        )
    }
}

/// Drains `rx` and applies each update to the shared map. Spawn once at
/// startup and keep running for the server's lifetime.
pub async fn start_job_updater(state: ImportJobs, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        jobs.insert(update.job_id, update.status);
    }
}
