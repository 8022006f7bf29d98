use crate::core::{DetectionContext, LineDetector, RawFinding, Severity, ThreatCategory};
use crate::detectors::{scan_rules, Rule};
use anyhow::Result;

const RECOMMENDATION: &str =
    "Rate-limit or block the source and review what the tool was able to reach.";

/// Signature scan for well-known offensive tooling user agents.
pub struct UserAgentDetector {
    rules: Vec<Rule>,
}

impl Default for UserAgentDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl UserAgentDetector {
    pub fn new() -> Self {
        let rules = vec![
            Rule::new(
                r"(?i)\b(?:metasploit|meterpreter)\b",
                "Malicious agent: exploitation framework",
                Severity::Critical,
                0.95,
                "Request attributed to an exploitation framework client.",
                "Execution",
                "T1203",
            ),
            Rule::new(
                r"(?i)\b(?:sqlmap|havij)\b",
                "Malicious agent: SQL injection tool",
                Severity::High,
                0.9,
                "Automated SQL injection tool signature.",
                "Initial Access",
                "T1190",
            ),
            Rule::new(
                r"(?i)\b(?:hydra|medusa|patator)\b",
                "Malicious agent: credential brute-forcing tool",
                Severity::High,
                0.9,
                "Known password-guessing tool signature.",
                "Credential Access",
                "T1110",
            ),
            Rule::new(
                r"(?i)\b(?:nikto|nessus|openvas|acunetix)\b",
                "Malicious agent: vulnerability scanner",
                Severity::Medium,
                0.85,
                "Commercial or open-source web vulnerability scanner signature.",
                "Reconnaissance",
                "T1595.002",
            ),
            Rule::new(
                r"(?i)\b(?:nmap|masscan|zgrab)\b",
                "Malicious agent: network scanner",
                Severity::Medium,
                0.8,
                "Port or service scanning client signature.",
                "Reconnaissance",
                "T1595.001",
            ),
            Rule::new(
                r"(?i)\b(?:dirbuster|gobuster|wfuzz|ffuf|feroxbuster)\b",
                "Malicious agent: content discovery tool",
                Severity::Medium,
                0.8,
                "Forced-browsing tool enumerating hidden paths.",
                "Reconnaissance",
                "T1595.003",
            ),
        ];
        Self { rules }
    }
}

impl LineDetector for UserAgentDetector {
    fn id(&self) -> &'static str {
        "user-agent"
    }

    fn name(&self) -> &'static str {
        "Malicious User-Agent Detector"
    }

    fn category(&self) -> ThreatCategory {
        ThreatCategory::MaliciousAgent
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
    fn detects_sqlmap_signature() {
        let detector = UserAgentDetector::new();
        let mut ctx = DetectionContext::new();
        let findings = detector
            .scan(
                r#"10.0.0.9 "GET /item?id=2" 500 "sqlmap/1.7.2#stable (https://sqlmap.org)""#,
                11,
                &mut ctx,
            )
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].category, ThreatCategory::MaliciousAgent);
    }

    #[test]
    fn regular_browser_is_clean() {
        let detector = UserAgentDetector::new();
        let mut ctx = DetectionContext::new();
        let findings = detector
            .scan(
                r#"10.0.0.9 "GET /" 200 "Mozilla/5.0 (X11; Linux x86_64) Firefox/126.0""#,
                11,
                &mut ctx,
            )
            .unwrap();
        assert!(findings.is_empty());
    }
}
