//! Failed-authentication tracking: brute force and password spray.
//!
//! The only per-line detector family that legitimately mutates shared
//! state: per-source failed-attempt counters and distinct-username sets
//! live in the [`DetectionContext`] so concurrent jobs stay isolated.

use crate::core::context::truncate_chars;
use crate::core::{
    DetectionContext, FindingSource, LineDetector, RawFinding, Severity, ThreatCategory,
};
use crate::detectors::extract::Extractors;
use crate::detectors::thresholds::{
    BRUTE_FORCE_CRITICAL_MULTIPLE, BRUTE_FORCE_THRESHOLD, PASSWORD_SPRAY_DISTINCT_USERS,
};
use crate::detectors::EVIDENCE_TRUNCATE_CHARS;
use anyhow::Result;
use regex::Regex;

pub struct AuthFailureDetector {
    failure: Regex,
    usernames: Vec<Regex>,
    extractors: Extractors,
    threshold: u32,
    critical_multiple: u32,
    spray_users: usize,
}

impl Default for AuthFailureDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthFailureDetector {
    pub fn new() -> Self {
        Self {
            failure: Regex::new(
                r"(?i)failed\s+password|authentication\s+failure|invalid\s+user|failed\s+login|login\s+failed|auth(?:entication)?\s+failed",
            )
            .unwrap(),
            usernames: vec![
                Regex::new(r"(?i)(?:invalid user|failed password for(?: invalid user)?)\s+([A-Za-z0-9._-]+)").unwrap(),
                Regex::new(r"(?i)\buser(?:name)?[=:]\s*([^\s&,]+)").unwrap(),
                Regex::new(r#"(?i)\blogin\s+['"]?([A-Za-z0-9._-]+)['"]?"#).unwrap(),
            ],
            extractors: Extractors::new(),
            threshold: BRUTE_FORCE_THRESHOLD,
            critical_multiple: BRUTE_FORCE_CRITICAL_MULTIPLE,
            spray_users: PASSWORD_SPRAY_DISTINCT_USERS,
        }
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold.max(1);
        self
    }

    fn extract_username(&self, line: &str) -> Option<String> {
        // Words that sit where a username would in common log phrasings.
        const NOT_USERNAMES: &[&str] = &["from", "for", "failed", "failure", "attempt", "on"];

        for pattern in &self.usernames {
            if let Some(captures) = pattern.captures(line) {
                if let Some(m) = captures.get(1) {
                    let user = m.as_str().trim_matches(|c| c == '\'' || c == '"');
                    if !user.is_empty()
                        && !NOT_USERNAMES.iter().any(|w| user.eq_ignore_ascii_case(w))
                    {
                        return Some(user.to_ascii_lowercase());
                    }
                }
            }
        }
        None
    }
}

impl LineDetector for AuthFailureDetector {
    fn id(&self) -> &'static str {
        "auth-failure"
    }

    fn name(&self) -> &'static str {
        "Brute Force / Password Spray Detector"
    }

    fn category(&self) -> ThreatCategory {
        ThreatCategory::BruteForce
    }

    fn scan(
        &self,
        line: &str,
        line_number: u64,
        ctx: &mut DetectionContext,
    ) -> Result<Vec<RawFinding>> {
        let matched = match self.failure.find(line) {
            Some(m) => m.as_str().to_string(),
            None => return Ok(Vec::new()),
        };
        let source = match self.extractors.first_ipv4(line) {
            Some(ip) => ip.to_string(),
            None => return Ok(Vec::new()),
        };

        let username = self.extract_username(line);
        let stats = ctx.source_mut(&source);
        stats.failed_auth += 1;
        let count = stats.failed_auth;

        let mut findings = Vec::new();

        if count >= self.threshold && count % self.threshold == 0 {
            let severity = if count >= self.threshold * self.critical_multiple {
                Severity::Critical
            } else {
                Severity::High
            };
            findings.push(
                RawFinding::new(
                    ThreatCategory::BruteForce,
                    severity,
                    FindingSource::Fast,
                    format!("Brute-force authentication attack from {source}"),
                    format!(
                        "{count} failed authentication attempts observed from {source}."
                    ),
                )
                .with_line(line_number, truncate_chars(line, EVIDENCE_TRUNCATE_CHARS))
                .with_matched_pattern(&matched)
                .with_confidence(if severity == Severity::Critical { 0.9 } else { 0.85 })
                .with_mitre("Credential Access", "T1110.001")
                .with_recommendation(
                    "Lock out or rate-limit the source address and require MFA for the targeted accounts.",
                ),
            );
        }

        if let Some(user) = username {
            stats.usernames.insert(user);
            if !stats.spray_emitted && stats.usernames.len() >= self.spray_users {
                stats.spray_emitted = true;
                let distinct = stats.usernames.len();
                findings.push(
                    RawFinding::new(
                        ThreatCategory::BruteForce,
                        Severity::Critical,
                        FindingSource::Fast,
                        format!("Password spray attack from {source}"),
                        format!(
                            "{distinct} distinct usernames attempted from {source}, consistent with low-and-slow password spraying."
                        ),
                    )
                    .with_line(line_number, truncate_chars(line, EVIDENCE_TRUNCATE_CHARS))
                    .with_matched_pattern(&matched)
                    .with_confidence(0.9)
                    .with_mitre("Credential Access", "T1110.003")
                    .with_recommendation(
                        "Reset credentials for the attempted accounts and block the source address.",
                    ),
                );
            }
        }

        Ok(findings)
    }
}
