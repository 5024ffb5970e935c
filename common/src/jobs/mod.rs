use serde::{Deserialize, Serialize};

/// Status of a background customer-import job, polled via
/// `GET /api/customers/import/status/{job_id}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    /// Rows processed so far.
    InProgress(u32),
    Completed(String),
    Failed(String),
}
