//! Detector traits for the streaming pass.
//!
//! Detectors are invoked once per line in a fixed registry order. Most are
//! stateless multi-pattern scanners; the brute-force and status-code
//! families legitimately mutate the shared per-source counters through the
//! context. A detector error never aborts the scan; the engine logs it
//! and treats it as "no findings from that detector for that line".

use crate::core::context::DetectionContext;
use crate::core::finding::RawFinding;
use crate::core::severity::ThreatCategory;
use anyhow::Result;

/// Per-line detector contract: `(normalized_line, line_number, context)
/// -> findings`.
pub trait LineDetector: Send + Sync {
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn category(&self) -> ThreatCategory;

    fn scan(
        &self,
        line: &str,
        line_number: u64,
        ctx: &mut DetectionContext,
    ) -> Result<Vec<RawFinding>>;
}

/// Stateful detector run exactly once after the pass, against the fully
/// populated accumulator.
pub trait PostPassDetector: Send + Sync {
    fn id(&self) -> &'static str;

    fn finalize(&self, ctx: &DetectionContext) -> Result<Vec<RawFinding>>;
}
