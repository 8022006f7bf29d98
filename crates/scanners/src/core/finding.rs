use crate::core::fingerprint::fingerprint;
use crate::core::severity::{Severity, ThreatCategory};
use serde::{Deserialize, Serialize};

/// Which pass produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FindingSource {
    /// Deterministic pattern/heuristic pass, always run.
    Fast,
    /// Contextual re-analysis by the external analyzer.
    Slow,
}

/// One detected security-relevant event.
///
/// The `fingerprint` field is derived from `(category, line_number,
/// line_content)` and is refreshed whenever any of those three change
/// through the builder methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFinding {
    pub severity: Severity,
    pub category: ThreatCategory,
    pub title: String,
    pub description: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub line_number: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub line_content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub matched_pattern: Option<String>,

    pub source: FindingSource,

    pub fingerprint: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub recommendation: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub confidence: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mitre_tactic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mitre_technique: Option<String>,

    /// Epoch milliseconds parsed from the log line, when extractable.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub event_timestamp: Option<i64>,
}

impl RawFinding {
    pub fn new(
        category: ThreatCategory,
        severity: Severity,
        source: FindingSource,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let mut finding = Self {
            severity,
            category,
            title: title.into(),
            description: description.into(),
            line_number: None,
            line_content: None,
            matched_pattern: None,
            source,
            fingerprint: String::new(),
            recommendation: None,
            confidence: None,
            mitre_tactic: None,
            mitre_technique: None,
            event_timestamp: None,
        };
        finding.refresh_fingerprint();
        finding
    }

    pub fn with_line(mut self, line_number: u64, line_content: impl Into<String>) -> Self {
        self.line_number = Some(line_number);
        self.line_content = Some(line_content.into());
        self.refresh_fingerprint();
        self
    }

    pub fn with_line_number(mut self, line_number: u64) -> Self {
        self.line_number = Some(line_number);
        self.refresh_fingerprint();
        self
    }

    pub fn with_line_content(mut self, line_content: impl Into<String>) -> Self {
        self.line_content = Some(line_content.into());
        self.refresh_fingerprint();
        self
    }

    pub fn with_matched_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.matched_pattern = Some(pattern.into());
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }

    pub fn with_mitre(mut self, tactic: impl Into<String>, technique: impl Into<String>) -> Self {
        self.mitre_tactic = Some(tactic.into());
        self.mitre_technique = Some(technique.into());
        self
    }

    pub fn with_event_timestamp(mut self, epoch_ms: i64) -> Self {
        self.event_timestamp = Some(epoch_ms);
        self
    }

    /// Replace the evidence text while keeping the identity inputs in sync.
    /// Used by the scan engine when normalization altered the line and the
    /// raw text is the better evidence.
    pub fn override_line_content(&mut self, line_content: String) {
        self.line_content = Some(line_content);
        self.refresh_fingerprint();
    }

    fn refresh_fingerprint(&mut self) {
        self.fingerprint = fingerprint(
            self.category,
            self.line_number,
            self.line_content.as_deref(),
        );
    }
}

/// Per-severity finding counts, as persisted on the job record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
    pub info: u64,
}

impl SeverityCounts {
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
            Severity::Info => self.info += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.critical + self.high + self.medium + self.low + self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_refreshes_fingerprint() {
        let base = RawFinding::new(
            ThreatCategory::SqlInjection,
            Severity::Critical,
            FindingSource::Fast,
            "t",
            "d",
        );
        let with_line = base.clone().with_line(10, "GET /?id=1 UNION SELECT");
        assert_ne!(base.fingerprint, with_line.fingerprint);

        let same_identity = RawFinding::new(
            ThreatCategory::SqlInjection,
            Severity::High, // severity does not feed the fingerprint
            FindingSource::Slow,
            "other title",
            "other description",
        )
        .with_line(10, "GET /?id=1 UNION SELECT");
        assert_eq!(with_line.fingerprint, same_identity.fingerprint);
    }

    #[test]
    fn override_content_changes_identity() {
        let mut finding = RawFinding::new(
            ThreatCategory::Xss,
            Severity::High,
            FindingSource::Fast,
            "t",
            "d",
        )
        .with_line(3, "normalized form");
        let before = finding.fingerprint.clone();
        finding.override_line_content("raw form".to_string());
        assert_ne!(before, finding.fingerprint);
    }

    #[test]
    fn severity_counts_accumulate() {
        let mut counts = SeverityCounts::default();
        counts.add(Severity::Critical);
        counts.add(Severity::Critical);
        counts.add(Severity::Info);
        assert_eq!(counts.critical, 2);
        assert_eq!(counts.info, 1);
        assert_eq!(counts.total(), 3);
    }
}
