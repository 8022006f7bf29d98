use crate::core::{DetectionContext, LineDetector, RawFinding, Severity, ThreatCategory};
use crate::detectors::{scan_rules, Rule};
use anyhow::Result;

const RECOMMENDATION: &str =
    "Canonicalize request paths before use and serve files only from an allow-listed root.";

pub struct PathTraversalDetector {
    rules: Vec<Rule>,
}

impl Default for PathTraversalDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl PathTraversalDetector {
    pub fn new() -> Self {
        let rules = vec![
            Rule::new(
                r"(?i)/etc/(?:passwd|shadow|sudoers)\b",
                "Path traversal: credential file access",
                Severity::Critical,
                0.9,
                "Request path resolves to a system credential file.",
                "Credential Access",
                "T1003.008",
            ),
            Rule::new(
                r"(?:\.\./){2,}|(?:\.\.\\){2,}",
                "Path traversal: repeated parent-directory escape",
                Severity::High,
                0.85,
                "Stacked ../ sequences walking out of the served directory.",
                "Initial Access",
                "T1190",
            ),
            Rule::new(
                r"(?i)(?:%2e%2e%2f|%2e%2e/|\.\.%2f|%252e%252e)",
                "Path traversal: encoded escape sequence",
                Severity::High,
                0.8,
                "URL-encoded ../ intended to slip past naive path filters.",
                "Defense Evasion",
                "T1027",
            ),
            Rule::new(
                r"(?i)(?:boot\.ini|win\.ini|windows\\system32)",
                "Path traversal: Windows system file probe",
                Severity::High,
                0.75,
                "Probe for well-known Windows files used to confirm traversal.",
                "Discovery",
                "T1083",
            ),
            Rule::new(
                r"(?i)(?:proc/self/environ|var/log/auth\.log)",
                "Path traversal: process or log file disclosure",
                Severity::High,
                0.75,
                "Attempt to read process environment or authentication logs.",
                "Discovery",
                "T1083",
            ),
        ];
        Self { rules }
    }
}

impl LineDetector for PathTraversalDetector {
    fn id(&self) -> &'static str {
        "path-traversal"
    }

    fn name(&self) -> &'static str {
        "Path Traversal Detector"
    }

    fn category(&self) -> ThreatCategory {
        ThreatCategory::PathTraversal
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_etc_passwd_with_escapes() {
        let detector = PathTraversalDetector::new();
        let mut ctx = DetectionContext::new();
        let findings = detector
            .scan("GET /static/../../../../etc/passwd HTTP/1.1", 9, &mut ctx)
            .unwrap();
        assert!(findings.iter().any(|f| f.severity == Severity::Critical));
        assert!(findings.iter().any(|f| f.title.contains("parent-directory")));
    }

    #[test]
    fn detects_encoded_escape() {
        let detector = PathTraversalDetector::new();
        let mut ctx = DetectionContext::new();
        let findings = detector
            .scan("GET /download?file=%2e%2e%2f%2e%2e%2fconfig.yml", 9, &mut ctx)
            .unwrap();
        assert!(!findings.is_empty());
    }

    #[test]
    fn relative_asset_path_is_clean() {
        let detector = PathTraversalDetector::new();
        let mut ctx = DetectionContext::new();
        let findings = detector
            .scan("GET /assets/../img/logo.png HTTP/1.1 200", 9, &mut ctx)
            .unwrap();
        assert!(findings.is_empty());
    }
}
