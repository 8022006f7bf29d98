//! Single-pass streaming scan engine.
//!
//! Drives one forward pass over a line-oriented source with O(1) working
//! memory beyond the per-job accumulator: the first ten lines are buffered
//! for format detection, then processed, and every subsequent line is
//! processed as it arrives. A detector failure is logged and contributes
//! no findings; it never aborts the scan.

use crate::core::context::truncate_chars;
use crate::core::{
    dedup_by_fingerprint, DetectionContext, LineDetector, PostPassDetector, RawFinding,
};
use crate::detectors::extract::Extractors;
use crate::detectors::RateAnomalyDetector;
use crate::detectors::EVIDENCE_TRUNCATE_CHARS;
use crate::normalize::{
    csv, detect_format, normalize_line, LogFormat, DETECTION_SAMPLE_LINES,
};
use anyhow::Result;
use std::io::BufRead;
use tracing::warn;

/// Result of one streaming pass.
#[derive(Debug)]
pub struct ScanOutcome {
    pub findings: Vec<RawFinding>,
    pub lines_processed: u64,
    pub lines_skipped: u64,
    pub detected_format: LogFormat,
    pub normalization_errors: u64,
}

pub struct ScanEngine {
    detectors: Vec<Box<dyn LineDetector>>,
    post_pass: Box<dyn PostPassDetector>,
    extractors: Extractors,
}

impl Default for ScanEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanEngine {
    /// Engine with the default ordered detector set.
    pub fn new() -> Self {
        Self::with_detectors(
            crate::runner::default_line_detectors(),
            Box::new(RateAnomalyDetector::new()),
        )
    }

    pub fn with_detectors(
        detectors: Vec<Box<dyn LineDetector>>,
        post_pass: Box<dyn PostPassDetector>,
    ) -> Self {
        Self {
            detectors,
            post_pass,
            extractors: Extractors::new(),
        }
    }

    /// Run the full pass over `reader`.
    pub fn run<R: BufRead>(&self, reader: R) -> Result<ScanOutcome> {
        let mut lines = reader.lines();
        let mut ctx = DetectionContext::new();
        let mut pass = PassState::default();

        // Phase 1: buffer a fixed-size sample so detection never needs the
        // whole file.
        let mut buffer: Vec<String> = Vec::with_capacity(DETECTION_SAMPLE_LINES);
        for line in lines.by_ref().take(DETECTION_SAMPLE_LINES) {
            buffer.push(line?);
        }

        let format = detect_format(&buffer);
        let mut csv_headers: Option<Vec<String>> = None;
        let mut header_index: Option<usize> = None;
        if format == LogFormat::Csv {
            if let Some((idx, header_line)) =
                buffer.iter().enumerate().find(|(_, l)| !l.trim().is_empty())
            {
                csv_headers = Some(csv::parse_headers(header_line));
                header_index = Some(idx);
            }
        }

        for (idx, raw) in buffer.iter().enumerate() {
            let line_number = idx as u64 + 1;
            self.process_line(
                raw,
                line_number,
                header_index == Some(idx),
                format,
                csv_headers.as_deref(),
                &mut ctx,
                &mut pass,
            );
        }

        // Phase 2: stream the remainder.
        let mut line_number = buffer.len() as u64;
        for line in lines {
            let raw = line?;
            line_number += 1;
            self.process_line(
                &raw,
                line_number,
                false,
                format,
                csv_headers.as_deref(),
                &mut ctx,
                &mut pass,
            );
        }

        match self.post_pass.finalize(&ctx) {
            Ok(post_findings) => pass.findings.extend(post_findings),
            Err(e) => warn!(detector = self.post_pass.id(), error = %e, "post-pass detector failed"),
        }

        Ok(ScanOutcome {
            findings: dedup_by_fingerprint(pass.findings),
            lines_processed: pass.processed,
            lines_skipped: pass.skipped,
            detected_format: format,
            normalization_errors: ctx.normalization_errors,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn process_line(
        &self,
        raw: &str,
        line_number: u64,
        is_header: bool,
        format: LogFormat,
        csv_headers: Option<&[String]>,
        ctx: &mut DetectionContext,
        pass: &mut PassState,
    ) {
        if raw.trim().is_empty() {
            pass.skipped += 1;
            return;
        }
        pass.processed += 1;
        ctx.total_lines += 1;
        ctx.current_line = line_number;

        // The CSV header row is consumed for column names only.
        if is_header {
            return;
        }

        let normalized = normalize_line(raw, format, csv_headers);
        if normalized.error {
            ctx.normalization_errors += 1;
        }

        let timestamp = self
            .extractors
            .timestamp_ms(raw)
            .or_else(|| self.extractors.timestamp_ms(&normalized.text));

        if let Some(source) = self.extractors.first_ipv4(raw) {
            let source = source.to_string();
            let is_error = self.extractors.is_http_error(&normalized.text);
            let stats = ctx.source_mut(&source);
            stats.total += 1;
            if is_error {
                stats.errors += 1;
            }
            if let Some(ts) = timestamp {
                stats.timestamps.push(ts);
            }
            stats.record_sample(raw);
        }

        for detector in &self.detectors {
            let mut found = match detector.scan(&normalized.text, line_number, ctx) {
                Ok(found) => found,
                Err(e) => {
                    warn!(detector = detector.id(), line = line_number, error = %e,
                        "detector failed; continuing scan");
                    continue;
                }
            };
            for finding in &mut found {
                if let Some(ts) = timestamp {
                    finding.event_timestamp = Some(ts);
                }
                if normalized.altered {
                    finding
                        .override_line_content(truncate_chars(raw, EVIDENCE_TRUNCATE_CHARS));
                }
            }
            pass.findings.append(&mut found);
        }
    }
}

#[derive(Default)]
struct PassState {
    findings: Vec<RawFinding>,
    processed: u64,
    skipped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Severity, ThreatCategory};
    use std::io::Cursor;

    fn run(input: &str) -> ScanOutcome {
        ScanEngine::new().run(Cursor::new(input.to_string())).unwrap()
    }

    #[test]
    fn brute_force_scenario_fires_exactly_at_line_ten() {
        let input = "Failed password for root from 10.0.0.5 port 22\n".repeat(10);
        let outcome = run(&input);

        let brute: Vec<_> = outcome
            .findings
            .iter()
            .filter(|f| f.category == ThreatCategory::BruteForce)
            .collect();
        assert_eq!(brute.len(), 1);
        assert_eq!(brute[0].severity, Severity::High);
        assert_eq!(brute[0].line_number, Some(10));
        assert_eq!(outcome.lines_processed, 10);
        assert_eq!(outcome.detected_format, LogFormat::Plain);
    }

    #[test]
    fn nine_identical_failures_stay_silent() {
        let input = "Failed password for root from 10.0.0.5 port 22\n".repeat(9);
        let outcome = run(&input);
        assert!(outcome
            .findings
            .iter()
            .all(|f| f.category != ThreatCategory::BruteForce));
    }

    #[test]
    fn union_select_yields_one_critical_sql_finding() {
        let outcome = run("GET /page?id=1 UNION SELECT user,pass FROM users\n");
        let sql: Vec<_> = outcome
            .findings
            .iter()
            .filter(|f| f.category == ThreatCategory::SqlInjection)
            .collect();
        assert_eq!(sql.len(), 1);
        assert_eq!(sql[0].severity, Severity::Critical);
        assert!(sql[0]
            .matched_pattern
            .as_deref()
            .unwrap()
            .contains("UNION SELECT"));
    }

    #[test]
    fn blank_lines_are_skipped_not_errors() {
        let outcome = run("\n   \nGET /ok HTTP/1.1 200\n\n");
        assert_eq!(outcome.lines_skipped, 3);
        assert_eq!(outcome.lines_processed, 1);
        assert_eq!(outcome.normalization_errors, 0);
    }

    #[test]
    fn jsonl_input_is_detected_and_raw_line_kept_as_evidence() {
        let input = r#"{"ip":"10.0.0.9","msg":"id=1 UNION SELECT secret FROM t"}"#;
        let outcome = run(&format!("{input}\n"));
        assert_eq!(outcome.detected_format, LogFormat::Jsonl);

        let sql = outcome
            .findings
            .iter()
            .find(|f| f.category == ThreatCategory::SqlInjection)
            .expect("sql finding");
        // Normalization altered the text, so evidence is the raw line.
        assert_eq!(sql.line_content.as_deref(), Some(input));
    }

    #[test]
    fn malformed_jsonl_line_degrades_and_is_counted() {
        let input = "{\"a\":1}\n{broken json\n";
        let outcome = run(input);
        assert_eq!(outcome.detected_format, LogFormat::Jsonl);
        assert_eq!(outcome.normalization_errors, 1);
        assert_eq!(outcome.lines_processed, 2);
    }

    #[test]
    fn csv_header_is_excluded_from_detection() {
        // The header names alone must not trigger anything.
        let input = "timestamp,src_ip,status,message\n\
                     2024-03-01T12:00:00Z,10.0.0.7,401,login failed for user admin\n";
        let outcome = run(input);
        assert_eq!(outcome.detected_format, LogFormat::Csv);
        assert_eq!(outcome.lines_processed, 2);
        assert!(outcome.findings.iter().all(|f| f.line_number != Some(1)));
        assert!(outcome
            .findings
            .iter()
            .any(|f| f.category == ThreatCategory::SuspiciousStatus && f.line_number == Some(2)));
    }

    #[test]
    fn outcome_contains_no_duplicate_fingerprints() {
        let input = "GET /page?id=1 UNION SELECT a,b FROM t\n".repeat(3);
        let outcome = run(&input);
        let fingerprints: Vec<_> = outcome.findings.iter().map(|f| &f.fingerprint).collect();
        let unique: std::collections::HashSet<_> = fingerprints.iter().collect();
        assert_eq!(fingerprints.len(), unique.len());
    }

    #[test]
    fn per_source_request_stats_accumulate() {
        let engine = ScanEngine::new();
        let input = "\
10.0.0.7 - - [01/Mar/2024:12:00:00 +0000] \"GET /a HTTP/1.1\" 404 1\n\
10.0.0.7 - - [01/Mar/2024:12:00:01 +0000] \"GET /b HTTP/1.1\" 200 1\n\
10.0.0.8 - - [01/Mar/2024:12:00:02 +0000] \"GET /c HTTP/1.1\" 500 1\n";
        let outcome = engine.run(Cursor::new(input.to_string())).unwrap();
        assert_eq!(outcome.lines_processed, 3);
        // 404 and 500 lines both count as HTTP errors; findings come from
        // the status table (500) but not 200.
        assert!(outcome
            .findings
            .iter()
            .any(|f| f.category == ThreatCategory::SuspiciousStatus));
    }

    #[test]
    fn empty_input_yields_empty_outcome() {
        let outcome = run("");
        assert!(outcome.findings.is_empty());
        assert_eq!(outcome.lines_processed, 0);
        assert_eq!(outcome.lines_skipped, 0);
        assert_eq!(outcome.detected_format, LogFormat::Plain);
    }
}
