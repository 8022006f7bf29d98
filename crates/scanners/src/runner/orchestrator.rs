//! Per-job analysis orchestration.
//!
//! A job walks `PENDING -> ANALYZING -> {COMPLETED, FAILED}` exactly once
//! per attempt and always reaches a terminal state: everything after the
//! fast pass degrades locally, while a missing input or a store failure
//! escalates to job failure with the captured message. The external
//! analyzer call is serialized process-wide through a size-1 semaphore and
//! bounded by a wall-clock timeout; incremental batches are merged and
//! persisted as they arrive, so a crash mid-slow-pass loses nothing that
//! was already pushed.

use crate::core::{merge_progressive, FindingSource, RawFinding, SeverityCounts};
use crate::engine::ScanEngine;
use crate::llm::{AnalyzeRequest, BatchSink, CancelToken, SlowPassAnalyzer};
use crate::progress::{JobSnapshot, ProgressSink};
use crate::source::LogSource;
use crate::store::{AnalysisJob, AnalysisStore, JobStatus, PassStatus};
use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tracing::{error, warn};

/// Default wall-clock bound on one analyzer invocation.
pub const DEFAULT_ANALYZER_TIMEOUT: Duration = Duration::from_secs(300);

/// Grace period after cancellation for the analyzer to unwind.
const CANCEL_GRACE: Duration = Duration::from_millis(100);

pub struct AnalysisOrchestrator {
    store: Arc<dyn AnalysisStore>,
    source: Arc<dyn LogSource>,
    analyzer: Arc<dyn SlowPassAnalyzer>,
    progress: Arc<dyn ProgressSink>,
    /// Size-1: at most one analyzer invocation across the process. Jobs
    /// queue for the slot in arrival order; waiting here never blocks
    /// another job's fast pass.
    analyzer_slot: Arc<Semaphore>,
    analyzer_timeout: Duration,
}

enum SlowPass {
    Completed { summary: Option<String> },
    Degraded { reason: String },
}

impl AnalysisOrchestrator {
    pub fn new(
        store: Arc<dyn AnalysisStore>,
        source: Arc<dyn LogSource>,
        analyzer: Arc<dyn SlowPassAnalyzer>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            store,
            source,
            analyzer,
            progress,
            analyzer_slot: Arc::new(Semaphore::new(1)),
            analyzer_timeout: DEFAULT_ANALYZER_TIMEOUT,
        }
    }

    /// Share one analyzer slot between several orchestrators.
    pub fn with_analyzer_slot(mut self, slot: Arc<Semaphore>) -> Self {
        self.analyzer_slot = slot;
        self
    }

    pub fn with_analyzer_timeout(mut self, timeout: Duration) -> Self {
        self.analyzer_timeout = timeout;
        self
    }

    /// Run a job from the start.
    pub async fn run(&self, job_id: &str) -> Result<AnalysisJob> {
        self.execute(job_id, false).await
    }

    /// Resume an interrupted job: when the fast pass already completed,
    /// skip it and re-invoke the slow pass onward against the persisted
    /// findings.
    pub async fn resume(&self, job_id: &str) -> Result<AnalysisJob> {
        self.execute(job_id, true).await
    }

    async fn execute(&self, job_id: &str, resume: bool) -> Result<AnalysisJob> {
        let mut job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or_else(|| anyhow!("unknown job {job_id}"))?;

        job.status = JobStatus::Analyzing;
        job.analysis_status = Some(PassStatus::InProgress);
        job.error_message = None;
        let started = self
            .store
            .save_job(&job)
            .await
            .context("failed to record ANALYZING transition");
        self.publish(&job, Some("analysis started"));

        let result = match started {
            Ok(()) => self.attempt(&mut job, resume).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                job.status = JobStatus::Completed;
                job.analysis_status = Some(PassStatus::Completed);
            }
            Err(e) => {
                error!(job = %job.id, error = %format!("{e:#}"), "analysis failed");
                job.status = JobStatus::Failed;
                job.analysis_status = Some(PassStatus::Failed);
                job.error_message = Some(format!("{e:#}"));
            }
        }

        if let Err(e) = self.store.save_job(&job).await {
            // The in-memory record is terminal either way; surface the
            // store failure on the job we hand back.
            error!(job = %job.id, error = %e, "failed to persist terminal job state");
            job.status = JobStatus::Failed;
            job.analysis_status = Some(PassStatus::Failed);
            job.error_message = Some(format!("failed to persist terminal state: {e}"));
        }
        self.publish(&job, None);
        Ok(job)
    }

    async fn attempt(&self, job: &mut AnalysisJob, resume: bool) -> Result<()> {
        let fast_findings = if resume && job.fast_pass_completed {
            self.store
                .findings_for_job(&job.id)
                .await?
                .into_iter()
                .filter(|f| f.source == FindingSource::Fast)
                .collect()
        } else {
            self.fast_pass(job).await?
        };

        if !self.analyzer.available() {
            job.slow_pass_available = false;
            job.slow_pass_completed = false;
        } else {
            job.slow_pass_available = true;
            match self.slow_pass(job, &fast_findings).await? {
                SlowPass::Completed { summary } => {
                    job.slow_pass_completed = true;
                    job.overall_summary = summary;
                }
                SlowPass::Degraded { reason } => {
                    warn!(job = %job.id, reason = %reason, "slow pass degraded; keeping fast-pass results");
                    job.slow_pass_completed = false;
                }
            }
        }

        // Counts come from the store's current set, never from memory, so
        // they are correct even after a resume.
        job.severity_counts = self.store.severity_counts(&job.id).await?;
        Ok(())
    }

    async fn fast_pass(&self, job: &mut AnalysisJob) -> Result<Vec<RawFinding>> {
        let reader = self
            .source
            .open(&job.source_path)
            .context("job input unavailable")?;

        let outcome = tokio::task::spawn_blocking(move || ScanEngine::new().run(reader))
            .await
            .context("scan task panicked")??;

        if !outcome.findings.is_empty() {
            self.store
                .insert_findings(&job.id, &outcome.findings)
                .await
                .context("phase-1 persistence failed")?;
        }

        job.fast_pass_completed = true;
        job.lines_processed = outcome.lines_processed;
        job.lines_skipped = outcome.lines_skipped;
        job.detected_format = Some(outcome.detected_format);
        job.severity_counts = count_severities(&outcome.findings);
        self.store.save_job(job).await?;
        self.publish(job, Some("fast pass complete"));

        Ok(outcome.findings)
    }

    async fn slow_pass(&self, job: &AnalysisJob, fast: &[RawFinding]) -> Result<SlowPass> {
        let _permit = self
            .analyzer_slot
            .acquire()
            .await
            .context("analyzer slot closed")?;

        let request = AnalyzeRequest {
            source_path: job.source_path.clone(),
            total_lines: job.lines_processed,
            detected_format: job
                .detected_format
                .unwrap_or(crate::normalize::LogFormat::Plain),
            fast_findings: fast.to_vec(),
        };

        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = ChannelSink { tx };
        let cancel = CancelToken::new();

        let mut analyze = self.analyzer.analyze(request, &sink, &cancel);
        let deadline = tokio::time::sleep(self.analyzer_timeout);
        tokio::pin!(deadline);

        let outcome = loop {
            tokio::select! {
                Some(batch) = rx.recv() => {
                    self.apply_batch(&job.id, fast, batch).await?;
                    self.publish(job, Some("slow-pass batch applied"));
                }
                result = &mut analyze => break result,
                () = &mut deadline => {
                    cancel.cancel();
                    // Give the collaborator a moment to observe the token.
                    let _ = tokio::time::timeout(CANCEL_GRACE, &mut analyze).await;
                    while let Ok(batch) = rx.try_recv() {
                        self.apply_batch(&job.id, fast, batch).await?;
                    }
                    return Ok(SlowPass::Degraded {
                        reason: format!("analyzer timed out after {:?}", self.analyzer_timeout),
                    });
                }
            }
        };

        // Batches pushed just before completion are still queued.
        while let Ok(batch) = rx.try_recv() {
            self.apply_batch(&job.id, fast, batch).await?;
        }

        match outcome {
            Ok(result) => {
                // The final list re-applies idempotently over whatever the
                // incremental batches already wrote.
                self.apply_batch(&job.id, fast, result.findings).await?;

                if !result.false_positive_lines.is_empty() {
                    self.store
                        .delete_findings_at_lines(
                            &job.id,
                            FindingSource::Fast,
                            &result.false_positive_lines,
                        )
                        .await?;
                }
                Ok(SlowPass::Completed {
                    summary: result.summary,
                })
            }
            Err(e) => Ok(SlowPass::Degraded {
                reason: e.to_string(),
            }),
        }
    }

    async fn apply_batch(
        &self,
        job_id: &str,
        fast: &[RawFinding],
        batch: Vec<RawFinding>,
    ) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let merged = merge_progressive(fast, batch);
        if !merged.enriched_slow.is_empty() {
            self.store
                .insert_findings(job_id, &merged.enriched_slow)
                .await?;
        }
        if !merged.superseded_fast.is_empty() {
            self.store
                .delete_findings_by_fingerprint(job_id, &merged.superseded_fast)
                .await?;
        }
        Ok(())
    }

    fn publish(&self, job: &AnalysisJob, message: Option<&str>) {
        self.progress.publish(JobSnapshot::of(job, message));
    }
}

struct ChannelSink {
    tx: mpsc::UnboundedSender<Vec<RawFinding>>,
}

impl BatchSink for ChannelSink {
    fn on_batch(&self, findings: Vec<RawFinding>) {
        let _ = self.tx.send(findings);
    }
}

fn count_severities(findings: &[RawFinding]) -> SeverityCounts {
    let mut counts = SeverityCounts::default();
    for finding in findings {
        counts.add(finding.severity);
    }
    counts
}
