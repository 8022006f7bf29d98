//! Per-job mutable accumulator shared by every detector during one
//! streaming pass.
//!
//! A fresh context is created at job start and dropped once the post-pass
//! detector has consumed it. Nothing here is process-wide, so concurrent
//! jobs stay fully isolated.

use std::collections::{HashMap, HashSet};

/// How many truncated raw sample lines are retained per source.
pub const SAMPLES_PER_SOURCE: usize = 3;

/// Sample lines are truncated to this many characters before retention.
pub const SAMPLE_TRUNCATE_CHARS: usize = 200;

/// Accumulated request statistics for one source identifier (an
/// IPv4-shaped token extracted from the raw line).
#[derive(Debug, Default, Clone)]
pub struct SourceStats {
    /// Lines attributed to this source.
    pub total: u64,
    /// Lines whose normalized text matched an HTTP 4xx/5xx pattern.
    pub errors: u64,
    /// Failed authentication attempts (brute-force counter).
    pub failed_auth: u32,
    /// Distinct usernames attempted, lowercased.
    pub usernames: HashSet<String>,
    /// Set once the password-spray finding has been emitted for this source.
    pub spray_emitted: bool,
    /// 404 responses (directory-enumeration counter).
    pub not_found: u32,
    /// Parsed event timestamps (epoch ms), in arrival order.
    pub timestamps: Vec<i64>,
    /// Up to [`SAMPLES_PER_SOURCE`] truncated raw lines.
    pub samples: Vec<String>,
}

impl SourceStats {
    pub fn record_sample(&mut self, raw: &str) {
        if self.samples.len() < SAMPLES_PER_SOURCE {
            self.samples.push(truncate_chars(raw, SAMPLE_TRUNCATE_CHARS));
        }
    }
}

#[derive(Debug, Default)]
pub struct DetectionContext {
    sources: HashMap<String, SourceStats>,
    /// Non-blank lines seen so far.
    pub total_lines: u64,
    /// 1-based number of the line currently in flight.
    pub current_line: u64,
    /// Lines whose JSON/CSV parse failed and degraded to passthrough.
    pub normalization_errors: u64,
}

impl DetectionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_mut(&mut self, source: &str) -> &mut SourceStats {
        self.sources.entry(source.to_string()).or_default()
    }

    pub fn source(&self, source: &str) -> Option<&SourceStats> {
        self.sources.get(source)
    }

    pub fn sources(&self) -> impl Iterator<Item = (&String, &SourceStats)> {
        self.sources.iter()
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}
