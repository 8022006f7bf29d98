use crate::core::{DetectionContext, LineDetector, RawFinding, Severity, ThreatCategory};
use crate::detectors::{scan_rules, Rule};
use anyhow::Result;

const RECOMMENDATION: &str =
    "Context-encode all reflected output and set a restrictive Content-Security-Policy.";

pub struct XssDetector {
    rules: Vec<Rule>,
}

impl Default for XssDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl XssDetector {
    pub fn new() -> Self {
        let rules = vec![
            Rule::new(
                r"(?i)<script[\s>/]",
                "Cross-site scripting: script tag injection",
                Severity::High,
                0.85,
                "Literal <script> element inside request data.",
                "Initial Access",
                "T1189",
            ),
            Rule::new(
                r"(?i)(?:%3c|&lt;)script",
                "Cross-site scripting: encoded script tag",
                Severity::High,
                0.8,
                "Script tag smuggled through URL or entity encoding.",
                "Defense Evasion",
                "T1027",
            ),
            Rule::new(
                r"(?i)\bon(?:error|load|click|mouseover|focus)\s*=",
                "Cross-site scripting: inline event handler",
                Severity::Medium,
                0.7,
                "HTML event handler attribute injected into a parameter.",
                "Initial Access",
                "T1189",
            ),
            Rule::new(
                r"(?i)javascript\s*:",
                "Cross-site scripting: javascript: URI",
                Severity::Medium,
                0.65,
                "javascript: scheme used where a URL is expected.",
                "Initial Access",
                "T1189",
            ),
            Rule::new(
                r"(?i)document\.(?:cookie|location)|window\.location",
                "Cross-site scripting: DOM property access",
                Severity::High,
                0.75,
                "Script body reading cookies or redirecting the document.",
                "Credential Access",
                "T1539",
            ),
        ];
        Self { rules }
    }
}

impl LineDetector for XssDetector {
    fn id(&self) -> &'static str {
        "xss"
    }

    fn name(&self) -> &'static str {
        "Cross-Site Scripting Detector"
    }

    fn category(&self) -> ThreatCategory {
        ThreatCategory::Xss
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
    fn detects_script_tag() {
        let detector = XssDetector::new();
        let mut ctx = DetectionContext::new();
        let findings = detector
            .scan("GET /search?q=<script>alert(1)</script>", 4, &mut ctx)
            .unwrap();
        assert!(!findings.is_empty());
        assert_eq!(findings[0].severity, Severity::High);
    }

    #[test]
    fn detects_encoded_script_tag() {
        let detector = XssDetector::new();
        let mut ctx = DetectionContext::new();
        let findings = detector
            .scan("GET /search?q=%3Cscript%3Ealert(1)%3C/script%3E", 4, &mut ctx)
            .unwrap();
        assert!(!findings.is_empty());
    }

    #[test]
    fn plain_search_is_clean() {
        let detector = XssDetector::new();
        let mut ctx = DetectionContext::new();
        let findings = detector
            .scan("GET /search?q=rust+scripting+guide", 4, &mut ctx)
            .unwrap();
        assert!(findings.is_empty());
    }
}
