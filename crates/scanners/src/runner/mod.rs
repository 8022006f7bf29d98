pub mod orchestrator;
pub mod registry;

pub use orchestrator::{AnalysisOrchestrator, DEFAULT_ANALYZER_TIMEOUT};
pub use registry::{default_line_detectors, DetectorInfo, DetectorRegistry};
