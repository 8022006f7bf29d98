//! logward-scanners: two-pass security analysis for server logs.
//!
//! A deterministic streaming pass normalizes heterogeneous log formats on
//! the fly and runs an ordered set of per-line detectors without buffering
//! the whole file; an optional slow pass hands the results to an external
//! LLM-backed analyzer for contextual re-analysis. The merge engine
//! reconciles both passes by fingerprint identity and line correlation,
//! and the orchestrator drives each job through a crash-tolerant state
//! machine with incremental persistence.

pub mod core;
pub mod detectors;
pub mod engine;
pub mod llm;
pub mod normalize;
pub mod progress;
pub mod runner;
pub mod source;
pub mod store;

pub use crate::core::{
    merge_flat, merge_progressive, FindingSource, RawFinding, Severity, SeverityCounts,
    ThreatCategory,
};
pub use engine::{ScanEngine, ScanOutcome};
pub use llm::{LlmAnalyzer, MockAnalyzer, SlowPassAnalyzer};
pub use normalize::LogFormat;
pub use progress::{JobSnapshot, NullSink, ProgressSink, TracingSink};
pub use runner::{AnalysisOrchestrator, DetectorRegistry};
pub use source::{FileSource, LogSource};
pub use store::{AnalysisJob, AnalysisStore, JobStatus, MemoryStore, PassStatus};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
