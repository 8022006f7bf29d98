//! In-memory store used by the CLI and the test suite.

use crate::core::{FindingSource, RawFinding, SeverityCounts};
use crate::store::{AnalysisJob, AnalysisStore};
use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryStore {
    jobs: Mutex<HashMap<String, AnalysisJob>>,
    findings: Mutex<HashMap<String, Vec<RawFinding>>>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose write operations fail, for exercising the fatal-error
    /// path.
    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes {
            bail!("store write rejected");
        }
        Ok(())
    }
}

#[async_trait]
impl AnalysisStore for MemoryStore {
    async fn get_job(&self, job_id: &str) -> Result<Option<AnalysisJob>> {
        Ok(self.jobs.lock().get(job_id).cloned())
    }

    async fn save_job(&self, job: &AnalysisJob) -> Result<()> {
        self.check_writable()?;
        let mut stored = job.clone();
        stored.updated_at = Utc::now();
        self.jobs.lock().insert(stored.id.clone(), stored);
        Ok(())
    }

    async fn insert_findings(&self, job_id: &str, findings: &[RawFinding]) -> Result<()> {
        self.check_writable()?;
        let mut all = self.findings.lock();
        let existing = all.entry(job_id.to_string()).or_default();
        for finding in findings {
            match existing
                .iter_mut()
                .find(|f| f.fingerprint == finding.fingerprint)
            {
                Some(slot) => *slot = finding.clone(),
                None => existing.push(finding.clone()),
            }
        }
        Ok(())
    }

    async fn delete_findings_by_fingerprint(
        &self,
        job_id: &str,
        fingerprints: &[String],
    ) -> Result<()> {
        self.check_writable()?;
        let mut all = self.findings.lock();
        if let Some(existing) = all.get_mut(job_id) {
            existing.retain(|f| !fingerprints.contains(&f.fingerprint));
        }
        Ok(())
    }

    async fn delete_findings_at_lines(
        &self,
        job_id: &str,
        source: FindingSource,
        lines: &[u64],
    ) -> Result<()> {
        self.check_writable()?;
        let mut all = self.findings.lock();
        if let Some(existing) = all.get_mut(job_id) {
            existing.retain(|f| {
                !(f.source == source
                    && f.line_number.map(|l| lines.contains(&l)).unwrap_or(false))
            });
        }
        Ok(())
    }

    async fn findings_for_job(&self, job_id: &str) -> Result<Vec<RawFinding>> {
        Ok(self
            .findings
            .lock()
            .get(job_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn severity_counts(&self, job_id: &str) -> Result<SeverityCounts> {
        let mut counts = SeverityCounts::default();
        if let Some(findings) = self.findings.lock().get(job_id) {
            for finding in findings {
                counts.add(finding.severity);
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Severity, ThreatCategory};

    fn finding(line: u64, content: &str, source: FindingSource) -> RawFinding {
        RawFinding::new(
            ThreatCategory::SqlInjection,
            Severity::High,
            source,
            "t",
            "d",
        )
        .with_line(line, content)
    }

    #[tokio::test]
    async fn insert_is_an_upsert_by_fingerprint() {
        let store = MemoryStore::new();
        let a = finding(1, "x", FindingSource::Fast);
        store.insert_findings("j", &[a.clone()]).await.unwrap();
        store.insert_findings("j", &[a.clone()]).await.unwrap();
        assert_eq!(store.findings_for_job("j").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_by_fingerprint_is_idempotent() {
        let store = MemoryStore::new();
        let a = finding(1, "x", FindingSource::Fast);
        store.insert_findings("j", &[a.clone()]).await.unwrap();
        let fps = vec![a.fingerprint.clone()];
        store.delete_findings_by_fingerprint("j", &fps).await.unwrap();
        store.delete_findings_by_fingerprint("j", &fps).await.unwrap();
        assert!(store.findings_for_job("j").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_at_lines_honors_source_filter() {
        let store = MemoryStore::new();
        let fast = finding(5, "x", FindingSource::Fast);
        let slow = finding(5, "y", FindingSource::Slow);
        store
            .insert_findings("j", &[fast.clone(), slow.clone()])
            .await
            .unwrap();
        store
            .delete_findings_at_lines("j", FindingSource::Fast, &[5])
            .await
            .unwrap();
        let remaining = store.findings_for_job("j").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].source, FindingSource::Slow);
    }

    #[tokio::test]
    async fn severity_counts_group_current_set() {
        let store = MemoryStore::new();
        store
            .insert_findings(
                "j",
                &[
                    finding(1, "a", FindingSource::Fast),
                    finding(2, "b", FindingSource::Fast),
                ],
            )
            .await
            .unwrap();
        let counts = store.severity_counts("j").await.unwrap();
        assert_eq!(counts.high, 2);
        assert_eq!(counts.total(), 2);
    }

    #[tokio::test]
    async fn failing_store_rejects_writes() {
        let store = MemoryStore::failing_writes();
        let job = AnalysisJob::new("j", "/tmp/x.log");
        assert!(store.save_job(&job).await.is_err());
        assert!(store.get_job("j").await.unwrap().is_none());
    }
}
