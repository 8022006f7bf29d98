//! Detection thresholds.
//!
//! Single override point: detectors take these as constructor defaults and
//! expose `with_threshold`-style builders; nothing else in the crate hard
//! codes a number.

/// Failed auth attempts from one source before the first brute-force
/// finding; re-emitted at every subsequent multiple.
pub const BRUTE_FORCE_THRESHOLD: u32 = 10;

/// Multiple of [`BRUTE_FORCE_THRESHOLD`] at which brute-force findings
/// escalate to CRITICAL.
pub const BRUTE_FORCE_CRITICAL_MULTIPLE: u32 = 5;

/// Distinct usernames attempted from one source before the single
/// password-spray finding fires.
pub const PASSWORD_SPRAY_DISTINCT_USERS: usize = 5;

/// 404 responses from one source before a directory-enumeration finding;
/// re-emitted at every subsequent multiple.
pub const ENUMERATION_404_THRESHOLD: u32 = 20;

/// Requests from one source before a volume finding.
pub const VOLUME_THRESHOLD: u64 = 100;

/// Multiples of [`VOLUME_THRESHOLD`] at which volume findings escalate to
/// HIGH and CRITICAL respectively.
pub const VOLUME_HIGH_MULTIPLE: u64 = 5;
pub const VOLUME_CRITICAL_MULTIPLE: u64 = 10;

/// Minimum requests before the error-rate check applies.
pub const ERROR_RATE_MIN_REQUESTS: u64 = 10;

/// Error ratio at or above which an error-rate finding fires.
pub const ERROR_RATE_RATIO: f64 = 0.8;

/// Consecutive sorted timestamps that must fall inside
/// [`BURST_WINDOW_MS`] for a burst finding.
pub const BURST_REQUEST_COUNT: usize = 20;

/// Burst window width in milliseconds.
pub const BURST_WINDOW_MS: i64 = 5_000;
