//! Log format detection and per-line normalization.
//!
//! Heterogeneous inputs (plain text, JSONL, CSV) are converted into a
//! single pattern-matchable form on the fly, preserving the original
//! line. Normalization never raises: a malformed JSON record degrades to
//! identity passthrough with the error flag set, and the scan engine
//! counts it.

pub mod csv;
pub mod flatten;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lines inspected by format detection; detection never buffers more.
pub const DETECTION_SAMPLE_LINES: usize = 10;

/// Header tokens whose presence as a leading CSV column marks the sample
/// as CSV rather than free text that happens to contain commas.
const CSV_HEADER_PREFIXES: &[&str] = &[
    "timestamp",
    "date",
    "time",
    "host",
    "ip",
    "src",
    "dst",
    "status",
    "user",
    "method",
    "url",
    "level",
    "event",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Plain,
    Jsonl,
    Csv,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Jsonl => write!(f, "jsonl"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// Result of normalizing one line.
#[derive(Debug, Clone)]
pub struct Normalized {
    /// Pattern-matchable text handed to the detectors.
    pub text: String,
    /// True when the text differs from the raw line, in which case the
    /// engine keeps the raw line as finding evidence.
    pub altered: bool,
    /// True when a structured parse failed and the raw line was passed
    /// through unchanged.
    pub error: bool,
}

impl Normalized {
    fn passthrough(raw: &str) -> Self {
        Self {
            text: raw.to_string(),
            altered: false,
            error: false,
        }
    }
}

/// Detect the input format by inspecting the first non-blank line of the
/// sample window.
pub fn detect_format(sample: &[String]) -> LogFormat {
    let first = match sample.iter().find(|l| !l.trim().is_empty()) {
        Some(line) => line.trim(),
        None => return LogFormat::Plain,
    };

    if first.starts_with('{')
        && serde_json::from_str::<serde_json::Value>(first)
            .map(|v| v.is_object())
            .unwrap_or(false)
    {
        return LogFormat::Jsonl;
    }

    if first.contains(',') {
        let leading = first
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if CSV_HEADER_PREFIXES
            .iter()
            .any(|prefix| leading.starts_with(prefix))
        {
            return LogFormat::Csv;
        }
    }

    LogFormat::Plain
}

/// Convert one raw line into pattern-matchable text.
///
/// `csv_headers` must be the parsed header row when `format` is CSV; the
/// header row itself is the caller's to exclude from detection.
pub fn normalize_line(raw: &str, format: LogFormat, csv_headers: Option<&[String]>) -> Normalized {
    match format {
        LogFormat::Plain => Normalized::passthrough(raw),
        LogFormat::Jsonl => match flatten::flatten_json(raw) {
            Ok(text) => {
                let altered = text != raw;
                Normalized {
                    text,
                    altered,
                    error: false,
                }
            }
            Err(_) => Normalized {
                text: raw.to_string(),
                altered: false,
                error: true,
            },
        },
        LogFormat::Csv => {
            let headers = match csv_headers {
                Some(headers) if !headers.is_empty() => headers,
                _ => return Normalized::passthrough(raw),
            };
            let fields = csv::split_fields(raw);
            let text = headers
                .iter()
                .zip(fields.iter())
                .map(|(h, v)| format!("{h}={v}"))
                .collect::<Vec<_>>()
                .join(" ");
            Normalized {
                altered: text != raw,
                text,
                error: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn json_object_is_jsonl() {
        assert_eq!(detect_format(&lines(&[r#"{"a":1}"#])), LogFormat::Jsonl);
    }

    #[test]
    fn json_array_is_plain() {
        assert_eq!(detect_format(&lines(&["[]"])), LogFormat::Plain);
    }

    #[test]
    fn known_header_is_csv() {
        assert_eq!(
            detect_format(&lines(&["timestamp,src_ip", "2024-01-01T00:00:00Z,1.2.3.4"])),
            LogFormat::Csv
        );
    }

    #[test]
    fn free_text_with_commas_is_plain() {
        assert_eq!(
            detect_format(&lines(&["error, something broke, badly"])),
            LogFormat::Plain
        );
    }

    #[test]
    fn empty_input_is_plain() {
        assert_eq!(detect_format(&[]), LogFormat::Plain);
        assert_eq!(detect_format(&lines(&["", "  "])), LogFormat::Plain);
    }

    #[test]
    fn blank_leading_lines_are_skipped() {
        assert_eq!(
            detect_format(&lines(&["", r#"{"msg":"x"}"#])),
            LogFormat::Jsonl
        );
    }

    #[test]
    fn jsonl_normalization_flattens() {
        let n = normalize_line(r#"{"ip":"1.2.3.4","msg":"hello"}"#, LogFormat::Jsonl, None);
        assert!(n.altered);
        assert!(!n.error);
        assert_eq!(n.text, "ip=1.2.3.4 msg=hello");
    }

    #[test]
    fn malformed_json_degrades_to_passthrough() {
        let raw = r#"{"broken":"#;
        let n = normalize_line(raw, LogFormat::Jsonl, None);
        assert!(n.error);
        assert!(!n.altered);
        assert_eq!(n.text, raw);
    }

    #[test]
    fn csv_rows_are_zipped_with_headers() {
        let headers = csv::parse_headers("timestamp,src_ip,status");
        let n = normalize_line(
            "2024-01-01T00:00:00Z,10.0.0.5,404",
            LogFormat::Csv,
            Some(&headers),
        );
        assert!(n.altered);
        assert_eq!(
            n.text,
            "timestamp=2024-01-01T00:00:00Z src_ip=10.0.0.5 status=404"
        );
    }

    #[test]
    fn plain_is_identity() {
        let raw = "Failed password for root from 10.0.0.5";
        let n = normalize_line(raw, LogFormat::Plain, None);
        assert!(!n.altered);
        assert_eq!(n.text, raw);
    }
}
