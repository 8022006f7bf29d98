//! Reconciles the fast (deterministic) and slow (contextual) finding sets.
//!
//! Two entry points share one correlation rule: findings match when they
//! share a fingerprint, or when they share a `category:line_number`
//! correlation key. Findings without a line number are never
//! cross-correlated; they are only fingerprint-deduplicated within their
//! own pass.

use crate::core::finding::RawFinding;
use std::collections::{HashMap, HashSet};

/// Confidence assumed for a fast-pass finding that carries none.
pub const FAST_DEFAULT_CONFIDENCE: f64 = 0.8;

/// Confidence assumed for a slow-pass finding that carries none.
pub const SLOW_DEFAULT_CONFIDENCE: f64 = 0.7;

/// `category:line_number`, or `None` when the finding has no line number.
pub fn correlation_key(finding: &RawFinding) -> Option<String> {
    finding
        .line_number
        .map(|line| format!("{}:{}", finding.category.as_str(), line))
}

/// Output of [`merge_progressive`]: the enriched slow findings to insert,
/// plus the fingerprints of already-persisted fast findings the caller
/// should delete.
#[derive(Debug, Default)]
pub struct ProgressiveMerge {
    pub enriched_slow: Vec<RawFinding>,
    pub superseded_fast: Vec<String>,
}

/// Merge both passes into one ranked list.
///
/// Where a slow finding supersedes a fast one it wins outright, inheriting
/// `line_content`/`matched_pattern` from the fast finding only when its own
/// are absent, and taking the max of both confidences (with per-pass
/// defaults). The result is sorted by severity rank, then line number
/// ascending with absent lines last.
pub fn merge_flat(fast: Vec<RawFinding>, slow: Vec<RawFinding>) -> Vec<RawFinding> {
    let outcome = correlate(&fast, slow);
    let superseded: HashSet<&str> = outcome.superseded_fast.iter().map(String::as_str).collect();

    let mut merged: Vec<RawFinding> = fast
        .into_iter()
        .filter(|f| !superseded.contains(f.fingerprint.as_str()))
        .collect();
    merged.extend(outcome.enriched_slow);
    sort_findings(&mut merged);
    merged
}

/// Progressive variant: identical correlation and inheritance logic, but
/// instead of producing a merged list it reports what to write and what to
/// delete, so a caller holding an already-persisted fast set never has to
/// rewrite the whole finding set.
///
/// Applying the result is idempotent on fingerprint identity: a fast
/// fingerprint that equals the enriched slow finding's own fingerprint is
/// excluded from `superseded_fast`, so insert and delete can be replayed or
/// reordered without losing the finding.
pub fn merge_progressive(fast: &[RawFinding], slow: Vec<RawFinding>) -> ProgressiveMerge {
    correlate(fast, slow)
}

fn correlate(fast: &[RawFinding], slow: Vec<RawFinding>) -> ProgressiveMerge {
    let by_fingerprint: HashMap<&str, &RawFinding> = fast
        .iter()
        .map(|f| (f.fingerprint.as_str(), f))
        .collect();
    let by_key: HashMap<String, &RawFinding> = fast
        .iter()
        .filter_map(|f| correlation_key(f).map(|k| (k, f)))
        .collect();

    let mut enriched = Vec::new();
    let mut superseded: Vec<String> = Vec::new();
    let mut seen_superseded: HashSet<String> = HashSet::new();
    let mut seen_slow: HashSet<String> = HashSet::new();

    for finding in slow {
        let matched_fast = by_fingerprint
            .get(finding.fingerprint.as_str())
            .copied()
            .or_else(|| {
                correlation_key(&finding).and_then(|key| by_key.get(&key).copied())
            });

        let finding = match matched_fast {
            Some(fast_finding) => {
                let enriched_finding = enrich(finding, fast_finding);
                if fast_finding.fingerprint != enriched_finding.fingerprint
                    && seen_superseded.insert(fast_finding.fingerprint.clone())
                {
                    superseded.push(fast_finding.fingerprint.clone());
                }
                enriched_finding
            }
            None => finding,
        };

        // First occurrence wins within the slow pass.
        if seen_slow.insert(finding.fingerprint.clone()) {
            enriched.push(finding);
        }
    }

    ProgressiveMerge {
        enriched_slow: enriched,
        superseded_fast: superseded,
    }
}

fn enrich(mut slow: RawFinding, fast: &RawFinding) -> RawFinding {
    if slow.line_content.is_none() {
        if let Some(content) = &fast.line_content {
            slow.override_line_content(content.clone());
        }
    }
    if slow.matched_pattern.is_none() {
        slow.matched_pattern = fast.matched_pattern.clone();
    }
    let fast_confidence = fast.confidence.unwrap_or(FAST_DEFAULT_CONFIDENCE);
    let slow_confidence = slow.confidence.unwrap_or(SLOW_DEFAULT_CONFIDENCE);
    slow.confidence = Some(fast_confidence.max(slow_confidence));
    slow
}

/// Severity rank descending, then line number ascending with absent lines
/// sorted last.
pub fn sort_findings(findings: &mut [RawFinding]) {
    findings.sort_by(|a, b| {
        b.severity
            .rank()
            .cmp(&a.severity.rank())
            .then_with(|| match (a.line_number, b.line_number) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
    });
}

/// Drop findings whose fingerprint was already seen; first occurrence wins.
pub fn dedup_by_fingerprint(findings: Vec<RawFinding>) -> Vec<RawFinding> {
    let mut seen = HashSet::new();
    findings
        .into_iter()
        .filter(|f| seen.insert(f.fingerprint.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::finding::FindingSource;
    use crate::core::severity::{Severity, ThreatCategory};

    fn fast(category: ThreatCategory, line: u64, content: &str) -> RawFinding {
        RawFinding::new(
            category,
            Severity::High,
            FindingSource::Fast,
            "fast title",
            "fast description",
        )
        .with_line(line, content)
        .with_matched_pattern("fast-pattern")
    }

    fn slow(category: ThreatCategory, line: u64) -> RawFinding {
        RawFinding::new(
            category,
            Severity::Critical,
            FindingSource::Slow,
            "slow title",
            "slow description",
        )
        .with_line_number(line)
    }

    #[test]
    fn correlated_slow_wins_and_inherits() {
        let f = fast(ThreatCategory::SqlInjection, 12, "UNION SELECT 1,2");
        let s = slow(ThreatCategory::SqlInjection, 12);

        let merged = merge_flat(vec![f.clone()], vec![s]);
        assert_eq!(merged.len(), 1);
        let winner = &merged[0];
        assert_eq!(winner.source, FindingSource::Slow);
        assert_eq!(winner.title, "slow title");
        assert_eq!(winner.line_content.as_deref(), Some("UNION SELECT 1,2"));
        assert_eq!(winner.matched_pattern.as_deref(), Some("fast-pattern"));
        // max(fast default 0.8, slow default 0.7)
        assert_eq!(winner.confidence, Some(0.8));
    }

    #[test]
    fn slow_keeps_own_fields_when_present() {
        let f = fast(ThreatCategory::Xss, 4, "<script>alert(1)</script>");
        let s = slow(ThreatCategory::Xss, 4)
            .with_line_content("slow evidence")
            .with_matched_pattern("slow-pattern")
            .with_confidence(0.95);

        let merged = merge_flat(vec![f], vec![s]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].line_content.as_deref(), Some("slow evidence"));
        assert_eq!(merged[0].matched_pattern.as_deref(), Some("slow-pattern"));
        assert_eq!(merged[0].confidence, Some(0.95));
    }

    #[test]
    fn null_line_findings_are_never_cross_correlated() {
        let f = RawFinding::new(
            ThreatCategory::RateAnomaly,
            Severity::Medium,
            FindingSource::Fast,
            "volume",
            "d",
        )
        .with_line_content("sample a");
        let s = RawFinding::new(
            ThreatCategory::RateAnomaly,
            Severity::High,
            FindingSource::Slow,
            "volume again",
            "d",
        );

        let merged = merge_flat(vec![f], vec![s]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn uncorrelated_findings_pass_through() {
        let f = fast(ThreatCategory::SqlInjection, 3, "a");
        let s = slow(ThreatCategory::PathTraversal, 9);
        let merged = merge_flat(vec![f], vec![s]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn sorted_by_severity_then_line_with_absent_last() {
        let mut findings = vec![
            fast(ThreatCategory::SqlInjection, 50, "a"),
            RawFinding::new(
                ThreatCategory::RateAnomaly,
                Severity::High,
                FindingSource::Fast,
                "no line",
                "d",
            ),
            fast(ThreatCategory::Xss, 2, "b"),
            RawFinding::new(
                ThreatCategory::BruteForce,
                Severity::Critical,
                FindingSource::Fast,
                "crit",
                "d",
            )
            .with_line(100, "c"),
        ];
        sort_findings(&mut findings);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[1].line_number, Some(2));
        assert_eq!(findings[2].line_number, Some(50));
        assert_eq!(findings[3].line_number, None);
    }

    #[test]
    fn progressive_reports_superseded_fingerprints() {
        let f = fast(ThreatCategory::CommandInjection, 7, "; rm -rf /");
        let s = slow(ThreatCategory::CommandInjection, 7).with_line_content("own evidence");

        let outcome = merge_progressive(std::slice::from_ref(&f), vec![s]);
        assert_eq!(outcome.enriched_slow.len(), 1);
        assert_eq!(outcome.superseded_fast, vec![f.fingerprint.clone()]);
        assert_ne!(outcome.enriched_slow[0].fingerprint, f.fingerprint);
    }

    #[test]
    fn identical_fingerprint_is_not_listed_as_superseded() {
        // The insert is an upsert of the same identity, so listing it for
        // deletion would make insert/delete ordering observable.
        let f = fast(ThreatCategory::PathTraversal, 5, "../../etc/passwd");
        let s = RawFinding::new(
            ThreatCategory::PathTraversal,
            Severity::Critical,
            FindingSource::Slow,
            "slow",
            "d",
        )
        .with_line(5, "../../etc/passwd");
        assert_eq!(f.fingerprint, s.fingerprint);

        let outcome = merge_progressive(std::slice::from_ref(&f), vec![s]);
        assert!(outcome.superseded_fast.is_empty());
        assert_eq!(outcome.enriched_slow.len(), 1);
    }

    #[test]
    fn dedup_is_idempotent() {
        let findings = vec![
            fast(ThreatCategory::SqlInjection, 1, "x"),
            fast(ThreatCategory::SqlInjection, 1, "x"),
            fast(ThreatCategory::SqlInjection, 2, "x"),
        ];
        let once = dedup_by_fingerprint(findings);
        assert_eq!(once.len(), 2);
        let twice = dedup_by_fingerprint(once.clone());
        assert_eq!(
            once.iter().map(|f| &f.fingerprint).collect::<Vec<_>>(),
            twice.iter().map(|f| &f.fingerprint).collect::<Vec<_>>()
        );
    }
}
