//! Post-pass traffic anomaly detection over the populated accumulator.
//!
//! Runs exactly once per job, after the streaming pass. Its findings carry
//! no line number, so the merge engine never cross-correlates them; their
//! identity comes from per-source evidence strings instead.

use crate::core::{
    DetectionContext, FindingSource, PostPassDetector, RawFinding, Severity, SourceStats,
    ThreatCategory,
};
use crate::detectors::thresholds::{
    BURST_REQUEST_COUNT, BURST_WINDOW_MS, ERROR_RATE_MIN_REQUESTS, ERROR_RATE_RATIO,
    VOLUME_CRITICAL_MULTIPLE, VOLUME_HIGH_MULTIPLE, VOLUME_THRESHOLD,
};
use anyhow::Result;

pub struct RateAnomalyDetector {
    volume_threshold: u64,
    error_rate_min: u64,
    error_rate_ratio: f64,
    burst_count: usize,
    burst_window_ms: i64,
}

impl Default for RateAnomalyDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl RateAnomalyDetector {
    pub fn new() -> Self {
        Self {
            volume_threshold: VOLUME_THRESHOLD,
            error_rate_min: ERROR_RATE_MIN_REQUESTS,
            error_rate_ratio: ERROR_RATE_RATIO,
            burst_count: BURST_REQUEST_COUNT,
            burst_window_ms: BURST_WINDOW_MS,
        }
    }

    pub fn with_volume_threshold(mut self, threshold: u64) -> Self {
        self.volume_threshold = threshold.max(1);
        self
    }

    pub fn with_burst_window(mut self, count: usize, window_ms: i64) -> Self {
        self.burst_count = count.max(2);
        self.burst_window_ms = window_ms.max(1);
        self
    }

    fn volume_finding(&self, source: &str, stats: &SourceStats) -> Option<RawFinding> {
        if stats.total < self.volume_threshold {
            return None;
        }
        let severity = if stats.total >= self.volume_threshold * VOLUME_CRITICAL_MULTIPLE {
            Severity::Critical
        } else if stats.total >= self.volume_threshold * VOLUME_HIGH_MULTIPLE {
            Severity::High
        } else {
            Severity::Medium
        };

        let rate = request_rate(stats);
        let mut description = format!("{} requests observed from {source}", stats.total);
        if let Some(rps) = rate {
            description.push_str(&format!(" (~{rps:.1} req/s over the observed window)"));
        }
        if let Some(sample) = stats.samples.first() {
            description.push_str(&format!(". Sample: {sample}"));
        }

        Some(
            RawFinding::new(
                ThreatCategory::RateAnomaly,
                severity,
                FindingSource::Fast,
                format!("High request volume from {source}"),
                description,
            )
            .with_line_content(format!("{} requests from {source}", stats.total))
            .with_confidence(0.7)
            .with_mitre("Impact", "T1498")
            .with_recommendation("Rate-limit the source and verify the traffic is legitimate."),
        )
    }

    fn error_rate_finding(&self, source: &str, stats: &SourceStats) -> Option<RawFinding> {
        if stats.total < self.error_rate_min {
            return None;
        }
        let ratio = stats.errors as f64 / stats.total as f64;
        if ratio < self.error_rate_ratio {
            return None;
        }
        let mut description = format!(
            "{} of {} requests from {source} produced 4xx/5xx responses ({:.0}%).",
            stats.errors,
            stats.total,
            ratio * 100.0
        );
        if let Some(sample) = stats.samples.first() {
            description.push_str(&format!(" Sample: {sample}"));
        }

        Some(
            RawFinding::new(
                ThreatCategory::RateAnomaly,
                Severity::High,
                FindingSource::Fast,
                format!("Abnormal error rate from {source}"),
                description,
            )
            .with_line_content(format!(
                "{}/{} error responses from {source}",
                stats.errors, stats.total
            ))
            .with_confidence(0.75)
            .with_mitre("Reconnaissance", "T1595.002")
            .with_recommendation(
                "An error ratio this high usually means scanning or fuzzing; block or throttle the source.",
            ),
        )
    }

    fn burst_finding(&self, source: &str, stats: &SourceStats) -> Option<RawFinding> {
        if stats.timestamps.len() < self.burst_count {
            return None;
        }
        let mut sorted = stats.timestamps.clone();
        sorted.sort_unstable();

        // At most one burst finding per source.
        for window in sorted.windows(self.burst_count) {
            let span = window[self.burst_count - 1] - window[0];
            if span <= self.burst_window_ms {
                return Some(
                    RawFinding::new(
                        ThreatCategory::RateAnomaly,
                        Severity::High,
                        FindingSource::Fast,
                        format!("Traffic burst from {source}"),
                        format!(
                            "{} requests from {source} within a {:.1}s window.",
                            self.burst_count,
                            span as f64 / 1000.0
                        ),
                    )
                    .with_line_content(format!("traffic burst from {source}"))
                    .with_confidence(0.75)
                    .with_mitre("Impact", "T1499")
                    .with_recommendation(
                        "Bursts of this density are automation; apply per-source rate limiting.",
                    ),
                );
            }
        }
        None
    }
}

impl PostPassDetector for RateAnomalyDetector {
    fn id(&self) -> &'static str {
        "rate-anomaly"
    }

    fn finalize(&self, ctx: &DetectionContext) -> Result<Vec<RawFinding>> {
        let mut sources: Vec<_> = ctx.sources().collect();
        sources.sort_by(|a, b| a.0.cmp(b.0));

        let mut findings = Vec::new();
        for (source, stats) in sources {
            findings.extend(self.volume_finding(source, stats));
            findings.extend(self.error_rate_finding(source, stats));
            findings.extend(self.burst_finding(source, stats));
        }
        Ok(findings)
    }
}

/// Average requests per second over the observed timestamp span, when at
/// least two timestamps were parsed and the span is non-zero.
fn request_rate(stats: &SourceStats) -> Option<f64> {
    let min = stats.timestamps.iter().min()?;
    let max = stats.timestamps.iter().max()?;
    let span_ms = max - min;
    if span_ms <= 0 {
        return None;
    }
    Some(stats.total as f64 / (span_ms as f64 / 1000.0))
}
