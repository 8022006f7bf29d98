//! Abstract persistence contract for jobs and findings.
//!
//! The real backing store lives behind this CRUD trait; its schema and
//! query engine are not this crate's concern. Findings are keyed by
//! fingerprint, so inserts are upserts and deletes are idempotent;
//! incremental slow-pass writes can be replayed or reordered safely.

pub mod memory;

pub use memory::MemoryStore;

use crate::core::{FindingSource, RawFinding, SeverityCounts};
use crate::normalize::LogFormat;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Analyzing,
    Completed,
    Failed,
}

/// Sub-status of the analysis record attached to a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassStatus {
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisJob {
    pub id: String,
    pub source_path: String,
    pub status: JobStatus,
    pub analysis_status: Option<PassStatus>,
    pub severity_counts: SeverityCounts,
    pub fast_pass_completed: bool,
    pub slow_pass_completed: bool,
    pub slow_pass_available: bool,
    pub overall_summary: Option<String>,
    pub error_message: Option<String>,
    pub lines_processed: u64,
    pub lines_skipped: u64,
    pub detected_format: Option<LogFormat>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AnalysisJob {
    pub fn new(id: impl Into<String>, source_path: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            source_path: source_path.into(),
            status: JobStatus::Pending,
            analysis_status: None,
            severity_counts: SeverityCounts::default(),
            fast_pass_completed: false,
            slow_pass_completed: false,
            slow_pass_available: false,
            overall_summary: None,
            error_message: None,
            lines_processed: 0,
            lines_skipped: 0,
            detected_format: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, JobStatus::Completed | JobStatus::Failed)
    }
}

#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn get_job(&self, job_id: &str) -> Result<Option<AnalysisJob>>;

    /// Create or update the job record.
    async fn save_job(&self, job: &AnalysisJob) -> Result<()>;

    /// Upsert findings by fingerprint.
    async fn insert_findings(&self, job_id: &str, findings: &[RawFinding]) -> Result<()>;

    /// Delete findings whose fingerprint is in `fingerprints`; unknown
    /// fingerprints are ignored.
    async fn delete_findings_by_fingerprint(
        &self,
        job_id: &str,
        fingerprints: &[String],
    ) -> Result<()>;

    /// Delete findings of the given source at any of the given lines.
    async fn delete_findings_at_lines(
        &self,
        job_id: &str,
        source: FindingSource,
        lines: &[u64],
    ) -> Result<()>;

    async fn findings_for_job(&self, job_id: &str) -> Result<Vec<RawFinding>>;

    /// Group-count the job's current findings by severity.
    async fn severity_counts(&self, job_id: &str) -> Result<SeverityCounts>;
}
