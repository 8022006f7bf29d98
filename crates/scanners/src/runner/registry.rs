//! Default detector set and metadata listing.
//!
//! The per-line detectors run in the fixed order defined here; reordering
//! changes which finding a line reports first, so the order is part of
//! the engine contract.

use crate::core::{LineDetector, ThreatCategory};
use crate::detectors::{
    AuthFailureDetector, CommandInjectionDetector, ExfiltrationDetector, PathTraversalDetector,
    PrivilegeEscalationDetector, SqlInjectionDetector, StatusCodeDetector, UserAgentDetector,
    XssDetector,
};

/// The default ordered per-line detector set.
pub fn default_line_detectors() -> Vec<Box<dyn LineDetector>> {
    vec![
        Box::new(SqlInjectionDetector::new()),
        Box::new(CommandInjectionDetector::new()),
        Box::new(XssDetector::new()),
        Box::new(PathTraversalDetector::new()),
        Box::new(AuthFailureDetector::new()),
        Box::new(StatusCodeDetector::new()),
        Box::new(UserAgentDetector::new()),
        Box::new(PrivilegeEscalationDetector::new()),
        Box::new(ExfiltrationDetector::new()),
    ]
}

#[derive(Debug, Clone)]
pub struct DetectorInfo {
    pub id: String,
    pub name: String,
    pub category: ThreatCategory,
}

pub struct DetectorRegistry {
    detectors: Vec<Box<dyn LineDetector>>,
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self {
            detectors: default_line_detectors(),
        }
    }
}

impl DetectorRegistry {
    pub fn infos(&self) -> Vec<DetectorInfo> {
        self.detectors
            .iter()
            .map(|d| DetectorInfo {
                id: d.id().to_string(),
                name: d.name().to_string(),
                category: d.category(),
            })
            .collect()
    }

    pub fn into_detectors(self) -> Vec<Box<dyn LineDetector>> {
        self.detectors
    }
}
