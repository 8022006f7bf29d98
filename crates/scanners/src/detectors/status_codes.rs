//! HTTP status code triage plus per-source 404 enumeration tracking.

use crate::core::context::truncate_chars;
use crate::core::{
    DetectionContext, FindingSource, LineDetector, RawFinding, Severity, ThreatCategory,
};
use crate::detectors::extract::Extractors;
use crate::detectors::thresholds::ENUMERATION_404_THRESHOLD;
use crate::detectors::EVIDENCE_TRUNCATE_CHARS;
use anyhow::Result;

struct StatusRule {
    code: u16,
    severity: Severity,
    confidence: f64,
    label: &'static str,
    description: &'static str,
    tactic: &'static str,
    technique: &'static str,
}

pub struct StatusCodeDetector {
    extractors: Extractors,
    table: Vec<StatusRule>,
    enumeration_threshold: u32,
}

impl Default for StatusCodeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusCodeDetector {
    pub fn new() -> Self {
        let table = vec![
            StatusRule {
                code: 401,
                severity: Severity::Medium,
                confidence: 0.6,
                label: "Unauthorized response (401)",
                description: "Request rejected for missing or invalid credentials.",
                tactic: "Credential Access",
                technique: "T1110",
            },
            StatusRule {
                code: 403,
                severity: Severity::Medium,
                confidence: 0.55,
                label: "Forbidden resource access (403)",
                description: "Request for a resource the client is not permitted to read.",
                tactic: "Discovery",
                technique: "T1083",
            },
            StatusRule {
                code: 405,
                severity: Severity::Low,
                confidence: 0.5,
                label: "Method probing (405)",
                description: "Disallowed HTTP method, often part of capability probing.",
                tactic: "Reconnaissance",
                technique: "T1595",
            },
            StatusRule {
                code: 500,
                severity: Severity::Medium,
                confidence: 0.5,
                label: "Server error (500)",
                description: "Internal error, possibly induced by malformed or hostile input.",
                tactic: "Initial Access",
                technique: "T1190",
            },
            StatusRule {
                code: 503,
                severity: Severity::Low,
                confidence: 0.45,
                label: "Service unavailable (503)",
                description: "Backend refused load, worth correlating with traffic volume.",
                tactic: "Impact",
                technique: "T1499",
            },
        ];
        Self {
            extractors: Extractors::new(),
            table,
            enumeration_threshold: ENUMERATION_404_THRESHOLD,
        }
    }

    pub fn with_enumeration_threshold(mut self, threshold: u32) -> Self {
        self.enumeration_threshold = threshold.max(1);
        self
    }
}

impl LineDetector for StatusCodeDetector {
    fn id(&self) -> &'static str {
        "status-codes"
    }

    fn name(&self) -> &'static str {
        "Suspicious Status Code Detector"
    }

    fn category(&self) -> ThreatCategory {
        ThreatCategory::SuspiciousStatus
    }

    fn scan(
        &self,
        line: &str,
        line_number: u64,
        ctx: &mut DetectionContext,
    ) -> Result<Vec<RawFinding>> {
        let status = match self.extractors.status_code(line) {
            Some(code) => code,
            None => return Ok(Vec::new()),
        };

        let mut findings = Vec::new();

        if let Some(rule) = self.table.iter().find(|r| r.code == status) {
            findings.push(
                RawFinding::new(
                    ThreatCategory::SuspiciousStatus,
                    rule.severity,
                    FindingSource::Fast,
                    rule.label,
                    rule.description,
                )
                .with_line(line_number, truncate_chars(line, EVIDENCE_TRUNCATE_CHARS))
                .with_matched_pattern(status.to_string())
                .with_confidence(rule.confidence)
                .with_mitre(rule.tactic, rule.technique),
            );
        }

        if status == 404 {
            if let Some(source) = self.extractors.first_ipv4(line) {
                let source = source.to_string();
                let stats = ctx.source_mut(&source);
                stats.not_found += 1;
                let count = stats.not_found;
                if count >= self.enumeration_threshold && count % self.enumeration_threshold == 0 {
                    findings.push(
                        RawFinding::new(
                            ThreatCategory::Enumeration,
                            Severity::High,
                            FindingSource::Fast,
                            format!("Directory enumeration from {source}"),
                            format!(
                                "{count} not-found responses served to {source}, consistent with forced browsing of hidden paths."
                            ),
                        )
                        .with_line(line_number, truncate_chars(line, EVIDENCE_TRUNCATE_CHARS))
                        .with_matched_pattern("404")
                        .with_confidence(0.8)
                        .with_mitre("Reconnaissance", "T1595.003")
                        .with_recommendation(
                            "Throttle the source address and audit which hidden paths returned 200.",
                        ),
                    );
                }
            }
        }

        Ok(findings)
    }
}
