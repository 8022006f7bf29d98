//! Wire schema for the external analyzer's JSON responses.

use crate::core::{FindingSource, RawFinding, Severity, ThreatCategory};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerResponse {
    #[serde(default)]
    pub findings: Vec<AnalyzerFinding>,

    #[serde(default)]
    pub summary: Option<String>,

    /// Line numbers of fast-pass findings the analyzer judged to be false
    /// positives.
    #[serde(default)]
    pub false_positive_line_numbers: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerFinding {
    pub severity: Severity,
    pub category: ThreatCategory,
    pub title: String,
    pub description: String,

    #[serde(default)]
    pub line_number: Option<u64>,

    #[serde(default)]
    pub line_content: Option<String>,

    #[serde(default)]
    pub matched_pattern: Option<String>,

    #[serde(default)]
    pub recommendation: Option<String>,

    #[serde(default)]
    pub confidence: Option<f64>,

    #[serde(default)]
    pub mitre_tactic: Option<String>,

    #[serde(default)]
    pub mitre_technique: Option<String>,
}

impl AnalyzerFinding {
    /// Convert into a slow-pass finding with a freshly derived fingerprint.
    pub fn into_raw(self) -> RawFinding {
        let mut finding = RawFinding::new(
            self.category,
            self.severity,
            FindingSource::Slow,
            self.title,
            self.description,
        );
        if let Some(line) = self.line_number {
            finding = finding.with_line_number(line);
        }
        if let Some(content) = self.line_content {
            finding = finding.with_line_content(content);
        }
        if let Some(pattern) = self.matched_pattern {
            finding = finding.with_matched_pattern(pattern);
        }
        if let Some(rec) = self.recommendation {
            finding = finding.with_recommendation(rec);
        }
        if let Some(confidence) = self.confidence {
            finding = finding.with_confidence(confidence);
        }
        if let (Some(tactic), Some(technique)) = (self.mitre_tactic, self.mitre_technique) {
            finding = finding.with_mitre(tactic, technique);
        }
        finding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_response() {
        let json = r#"{
            "findings": [{
                "severity": "CRITICAL",
                "category": "SQL_INJECTION",
                "title": "Confirmed injection",
                "description": "Chained requests show successful extraction.",
                "line_number": 42
            }],
            "summary": "One confirmed attack chain."
        }"#;
        let response: AnalyzerResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.findings.len(), 1);
        assert!(response.false_positive_line_numbers.is_empty());

        let raw = response.findings[0].clone().into_raw();
        assert_eq!(raw.source, FindingSource::Slow);
        assert_eq!(raw.severity, Severity::Critical);
        assert_eq!(raw.line_number, Some(42));
        assert_eq!(raw.fingerprint.len(), 16);
    }

    #[test]
    fn unknown_severity_is_rejected() {
        let json = r#"{"findings":[{"severity":"WHATEVER","category":"XSS","title":"t","description":"d"}]}"#;
        assert!(serde_json::from_str::<AnalyzerResponse>(json).is_err());
    }
}
