//! Per-job progress publication.
//!
//! The orchestrator pushes job-state snapshots through this sink after
//! every meaningful transition; the transport that fans them out to
//! clients is out of scope.

use crate::core::SeverityCounts;
use crate::store::{AnalysisJob, JobStatus, PassStatus};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub job_id: String,
    pub status: JobStatus,
    pub analysis_status: Option<PassStatus>,
    pub fast_pass_completed: bool,
    pub slow_pass_completed: bool,
    pub slow_pass_available: bool,
    pub severity_counts: SeverityCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl JobSnapshot {
    pub fn of(job: &AnalysisJob, message: Option<&str>) -> Self {
        Self {
            job_id: job.id.clone(),
            status: job.status,
            analysis_status: job.analysis_status,
            fast_pass_completed: job.fast_pass_completed,
            slow_pass_completed: job.slow_pass_completed,
            slow_pass_available: job.slow_pass_available,
            severity_counts: job.severity_counts,
            message: message.map(str::to_string),
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn publish(&self, snapshot: JobSnapshot);
}

/// Discards every snapshot.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn publish(&self, _snapshot: JobSnapshot) {}
}

/// Emits snapshots to the tracing subscriber.
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn publish(&self, snapshot: JobSnapshot) {
        debug!(
            job = %snapshot.job_id,
            status = ?snapshot.status,
            message = snapshot.message.as_deref().unwrap_or(""),
            "job progress"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_mirrors_job_fields() {
        let mut job = AnalysisJob::new("job-1", "/tmp/a.log");
        job.status = JobStatus::Analyzing;
        job.fast_pass_completed = true;

        let snapshot = JobSnapshot::of(&job, Some("fast pass complete"));
        assert_eq!(snapshot.job_id, "job-1");
        assert_eq!(snapshot.status, JobStatus::Analyzing);
        assert!(snapshot.fast_pass_completed);
        assert_eq!(snapshot.message.as_deref(), Some("fast pass complete"));
    }
}
