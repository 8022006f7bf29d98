use crate::core::{DetectionContext, LineDetector, RawFinding, Severity, ThreatCategory};
use crate::detectors::{scan_rules, Rule};
use anyhow::Result;

const RECOMMENDATION: &str =
    "Use parameterized queries and reject raw SQL metacharacters at the input boundary.";

pub struct SqlInjectionDetector {
    rules: Vec<Rule>,
}

impl Default for SqlInjectionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlInjectionDetector {
    pub fn new() -> Self {
        let rules = vec![
            Rule::new(
                r"(?i)union[\s+%20]+(?:all[\s+%20]+)?select",
                "SQL injection: UNION-based query manipulation",
                Severity::Critical,
                0.9,
                "Request contains a UNION SELECT clause used to append attacker-controlled result sets.",
                "Initial Access",
                "T1190",
            ),
            Rule::new(
                r"(?i)(?:'|%27)\s*or\s*(?:'|%27)?1(?:'|%27)?\s*=\s*(?:'|%27)?1",
                "SQL injection: tautology-based authentication bypass",
                Severity::Critical,
                0.85,
                "Classic OR 1=1 tautology that forces a WHERE clause to evaluate true.",
                "Initial Access",
                "T1190",
            ),
            Rule::new(
                r"(?i);\s*(?:drop|truncate|alter)\s+(?:table|database)",
                "SQL injection: destructive stacked query",
                Severity::Critical,
                0.9,
                "Stacked statement attempting to drop or alter schema objects.",
                "Impact",
                "T1485",
            ),
            Rule::new(
                r"(?i)\b(?:sleep|benchmark|pg_sleep)\s*\(|waitfor\s+delay",
                "SQL injection: time-based blind probe",
                Severity::High,
                0.8,
                "Timing primitive used to confirm blind SQL injection.",
                "Discovery",
                "T1190",
            ),
            Rule::new(
                r"(?i)\b(?:information_schema|sysobjects|mysql\.user)\b",
                "SQL injection: schema enumeration",
                Severity::High,
                0.75,
                "Query against database metadata tables to map the schema.",
                "Discovery",
                "T1082",
            ),
            Rule::new(
                r"(?i)(?:'|%27)\s*(?:and|or)\b.*(?:--|#|%23)\s*$",
                "SQL injection: comment-terminated predicate",
                Severity::High,
                0.7,
                "Boolean predicate followed by a comment marker that truncates the original query.",
                "Initial Access",
                "T1190",
            ),
        ];
        Self { rules }
    }
}

impl LineDetector for SqlInjectionDetector {
    fn id(&self) -> &'static str {
        "sql-injection"
    }

    fn name(&self) -> &'static str {
        "SQL Injection Detector"
    }

    fn category(&self) -> ThreatCategory {
        ThreatCategory::SqlInjection
    }

    fn scan(
        &self,
        line: &str,
        line_number: u64,
        _ctx: &mut DetectionContext,
    ) -> Result<Vec<RawFinding>> {
        Ok(scan_rules(
            &self.rules,
            self.category(),
            RECOMMENDATION,
            line,
            line_number,
        ))
    }
}
