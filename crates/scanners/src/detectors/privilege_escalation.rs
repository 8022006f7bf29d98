use crate::core::{DetectionContext, LineDetector, RawFinding, Severity, ThreatCategory};
use crate::detectors::{scan_rules, Rule};
use anyhow::Result;

const RECOMMENDATION: &str =
    "Audit the affected account and host; verify sudoers and group membership changes.";

pub struct PrivilegeEscalationDetector {
    rules: Vec<Rule>,
}

impl Default for PrivilegeEscalationDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl PrivilegeEscalationDetector {
    pub fn new() -> Self {
        let rules = vec![
            Rule::new(
                r"(?i)>>?\s*/etc/(?:passwd|sudoers)\b",
                "Privilege escalation: credential file modification",
                Severity::Critical,
                0.9,
                "Write redirection into /etc/passwd or /etc/sudoers.",
                "Persistence",
                "T1098",
            ),
            Rule::new(
                r"(?i)\busermod\s+(?:-a\s+)?-G\s+(?:sudo|wheel|admin|root)\b",
                "Privilege escalation: privileged group grant",
                Severity::High,
                0.85,
                "Account added to a privileged group.",
                "Privilege Escalation",
                "T1098",
            ),
            Rule::new(
                r"(?i)\bchmod\s+(?:\+s|[24][0-7]{3})\b",
                "Privilege escalation: setuid bit manipulation",
                Severity::High,
                0.8,
                "setuid/setgid bit set on a binary.",
                "Privilege Escalation",
                "T1548.001",
            ),
            Rule::new(
                r"(?i)\bsudo\s+su\b|\bsu\s+(?:-\s+)?root\b",
                "Privilege escalation: interactive root switch",
                Severity::Medium,
                0.6,
                "Interactive escalation to the root account.",
                "Privilege Escalation",
                "T1548.003",
            ),
            Rule::new(
                r"(?i)\b(?:pkexec|dirtycow|dirty_pipe|polkit)\b",
                "Privilege escalation: known exploit indicator",
                Severity::High,
                0.75,
                "Token associated with a public local privilege escalation exploit.",
                "Privilege Escalation",
                "T1068",
            ),
            Rule::new(
                r"uid=0\(root\)",
                "Privilege escalation: root context confirmation",
                Severity::Medium,
                0.65,
                "id(1) output confirming a root execution context.",
                "Discovery",
                "T1033",
            ),
        ];
        Self { rules }
    }
}

impl LineDetector for PrivilegeEscalationDetector {
    fn id(&self) -> &'static str {
        "privilege-escalation"
    }

    fn name(&self) -> &'static str {
        "Privilege Escalation Detector"
    }

    fn category(&self) -> ThreatCategory {
        ThreatCategory::PrivilegeEscalation
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
