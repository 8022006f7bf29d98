//! The detection rule set.
//!
//! One module per detector family. Most families are stateless
//! multi-pattern regex scanners over a private ordered rule table; the
//! auth-failure and status-code families additionally drive per-source
//! counters in the [`DetectionContext`], and the rate-anomaly detector
//! runs once after the streaming pass.

pub mod auth_failure;
pub mod command_injection;
pub mod exfiltration;
pub mod extract;
pub mod path_traversal;
pub mod privilege_escalation;
pub mod rate_anomaly;
pub mod sql_injection;
pub mod status_codes;
pub mod thresholds;
pub mod user_agent;
pub mod xss;

pub use auth_failure::AuthFailureDetector;
pub use command_injection::CommandInjectionDetector;
pub use exfiltration::ExfiltrationDetector;
pub use path_traversal::PathTraversalDetector;
pub use privilege_escalation::PrivilegeEscalationDetector;
pub use rate_anomaly::RateAnomalyDetector;
pub use sql_injection::SqlInjectionDetector;
pub use status_codes::StatusCodeDetector;
pub use user_agent::UserAgentDetector;
pub use xss::XssDetector;

use crate::core::context::truncate_chars;
use crate::core::{FindingSource, RawFinding, Severity, ThreatCategory};
use regex::Regex;

/// Evidence lines attached to findings are truncated to this many chars.
pub(crate) const EVIDENCE_TRUNCATE_CHARS: usize = 500;

/// One row of a detector's pattern table.
pub(crate) struct Rule {
    regex: Regex,
    label: &'static str,
    severity: Severity,
    confidence: f64,
    description: &'static str,
    tactic: &'static str,
    technique: &'static str,
}

impl Rule {
    pub(crate) fn new(
        pattern: &str,
        label: &'static str,
        severity: Severity,
        confidence: f64,
        description: &'static str,
        tactic: &'static str,
        technique: &'static str,
    ) -> Self {
        Self {
            regex: Regex::new(pattern).unwrap(),
            label,
            severity,
            confidence,
            description,
            tactic,
            technique,
        }
    }
}

/// Run a rule table against one line; every matching row emits one
/// finding carrying the matched text as its pattern evidence.
pub(crate) fn scan_rules(
    rules: &[Rule],
    category: ThreatCategory,
    recommendation: &str,
    line: &str,
    line_number: u64,
) -> Vec<RawFinding> {
    let mut findings = Vec::new();
    for rule in rules {
        if let Some(m) = rule.regex.find(line) {
            findings.push(
                RawFinding::new(
                    category,
                    rule.severity,
                    FindingSource::Fast,
                    rule.label,
                    rule.description,
                )
                .with_line(line_number, truncate_chars(line, EVIDENCE_TRUNCATE_CHARS))
                .with_matched_pattern(m.as_str())
                .with_confidence(rule.confidence)
                .with_mitre(rule.tactic, rule.technique)
                .with_recommendation(recommendation),
            );
        }
    }
    findings
}
