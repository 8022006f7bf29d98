use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Critical => write!(f, "CRITICAL"),
            Self::High => write!(f, "HIGH"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::Low => write!(f, "LOW"),
            Self::Info => write!(f, "INFO"),
        }
    }
}

impl Severity {
    /// Rank used for report ordering; higher is more severe.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 4,
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
            Self::Info => 0,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Critical => "🔴",
            Self::High => "🟠",
            Self::Medium => "🟡",
            Self::Low => "🟢",
            Self::Info => "🔵",
        }
    }
}

/// Closed set of threat categories a finding can belong to.
///
/// The category is one of the three fingerprint inputs, so renaming a
/// variant's wire form invalidates previously persisted fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreatCategory {
    SqlInjection,
    CommandInjection,
    Xss,
    PathTraversal,
    BruteForce,
    Enumeration,
    SuspiciousStatus,
    MaliciousAgent,
    PrivilegeEscalation,
    Exfiltration,
    RateAnomaly,
    Other,
}

impl ThreatCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SqlInjection => "SQL_INJECTION",
            Self::CommandInjection => "COMMAND_INJECTION",
            Self::Xss => "XSS",
            Self::PathTraversal => "PATH_TRAVERSAL",
            Self::BruteForce => "BRUTE_FORCE",
            Self::Enumeration => "ENUMERATION",
            Self::SuspiciousStatus => "SUSPICIOUS_STATUS",
            Self::MaliciousAgent => "MALICIOUS_AGENT",
            Self::PrivilegeEscalation => "PRIVILEGE_ESCALATION",
            Self::Exfiltration => "EXFILTRATION",
            Self::RateAnomaly => "RATE_ANOMALY",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for ThreatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering_matches_rank() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert!(Severity::Low > Severity::Info);
        assert_eq!(Severity::Critical.rank(), 4);
        assert_eq!(Severity::Info.rank(), 0);
    }

    #[test]
    fn category_wire_form_is_stable() {
        assert_eq!(ThreatCategory::SqlInjection.as_str(), "SQL_INJECTION");
        assert_eq!(
            serde_json::to_string(&ThreatCategory::BruteForce).unwrap(),
            "\"BRUTE_FORCE\""
        );
    }
}
