//! Token extraction shared by the scan engine and the stateful detectors.

use chrono::{Datelike, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

pub struct Extractors {
    ipv4: Regex,
    status_kv: Regex,
    status_http: Regex,
    rfc3339: Regex,
    naive_datetime: Regex,
    common_log: Regex,
    syslog: Regex,
}

impl Default for Extractors {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractors {
    pub fn new() -> Self {
        Self {
            ipv4: Regex::new(r"\b(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})\b").unwrap(),
            status_kv: Regex::new(r#"(?i)\bstatus(?:_?code)?["=:\s]+(\d{3})\b"#).unwrap(),
            status_http: Regex::new(r#"HTTP/[0-9.]+"?\s+(\d{3})\b"#).unwrap(),
            rfc3339: Regex::new(
                r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})",
            )
            .unwrap(),
            naive_datetime: Regex::new(r"\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}:\d{2}").unwrap(),
            common_log: Regex::new(r"\d{2}/[A-Za-z]{3}/\d{4}:\d{2}:\d{2}:\d{2} [+-]\d{4}").unwrap(),
            syslog: Regex::new(r"^[A-Za-z]{3}\s+\d{1,2}\s\d{2}:\d{2}:\d{2}").unwrap(),
        }
    }

    /// First IPv4-shaped token in the line, used as the per-source key.
    pub fn first_ipv4<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.ipv4.find_iter(line).map(|m| m.as_str()).find(|ip| {
            ip.split('.')
                .all(|octet| octet.parse::<u16>().map(|n| n <= 255).unwrap_or(false))
        })
    }

    /// HTTP status code, from `status=NNN`-style pairs or common-log text.
    pub fn status_code(&self, line: &str) -> Option<u16> {
        self.status_kv
            .captures(line)
            .or_else(|| self.status_http.captures(line))
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .filter(|code| (100..600).contains(code))
    }

    /// True when the line carries an HTTP 4xx/5xx response.
    pub fn is_http_error(&self, line: &str) -> bool {
        matches!(self.status_code(line), Some(code) if code >= 400)
    }

    /// Event timestamp in epoch milliseconds, trying RFC 3339, naive
    /// `YYYY-MM-DD HH:MM:SS` (read as UTC), Apache common-log, then
    /// syslog (current year assumed) in that order.
    pub fn timestamp_ms(&self, line: &str) -> Option<i64> {
        if let Some(m) = self.rfc3339.find(line) {
            if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(m.as_str()) {
                return Some(ts.timestamp_millis());
            }
        }
        if let Some(m) = self.common_log.find(line) {
            if let Ok(ts) = chrono::DateTime::parse_from_str(m.as_str(), "%d/%b/%Y:%H:%M:%S %z") {
                return Some(ts.timestamp_millis());
            }
        }
        if let Some(m) = self.naive_datetime.find(line) {
            let normalized = m.as_str().replace('T', " ");
            if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S") {
                return Some(Utc.from_utc_datetime(&naive).timestamp_millis());
            }
        }
        if let Some(m) = self.syslog.find(line) {
            let with_year = format!("{} {}", Utc::now().year(), m.as_str());
            if let Ok(naive) = NaiveDateTime::parse_from_str(&with_year, "%Y %b %e %H:%M:%S") {
                return Some(Utc.from_utc_datetime(&naive).timestamp_millis());
            }
        }
        None
    }
}
