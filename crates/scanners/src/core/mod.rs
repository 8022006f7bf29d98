//! Core abstractions for the two-pass analysis pipeline.
//!
//! The detector traits define the per-line and post-pass contracts all
//! rule families implement, findings are content-addressed through the
//! fingerprint module, and the merge engine reconciles the deterministic
//! pass with the external analyzer's results.

pub mod context;
pub mod detector;
pub mod finding;
pub mod fingerprint;
pub mod merge;
pub mod severity;

pub use context::{DetectionContext, SourceStats};
pub use detector::{LineDetector, PostPassDetector};
pub use finding::{FindingSource, RawFinding, SeverityCounts};
pub use fingerprint::fingerprint;
pub use merge::{
    correlation_key, dedup_by_fingerprint, merge_flat, merge_progressive, sort_findings,
    ProgressiveMerge,
};
pub use severity::{Severity, ThreatCategory};
