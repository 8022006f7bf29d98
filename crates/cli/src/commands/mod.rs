pub mod analyze;
pub mod render;
pub mod scan;

use anyhow::Result;
use colored::*;
use logward_scanners::DetectorRegistry;

pub fn list_detectors() -> Result<()> {
    let registry = DetectorRegistry::default();
    println!("{}", "Detector families (fixed scan order):".bold());
    for info in registry.infos() {
        println!(
            "  {:<22} {:<20} {}",
            info.id.bright_white(),
            info.category.to_string().cyan(),
            info.name
        );
    }
    println!("  {:<22} {:<20} {}", "rate-anomaly".bright_white(), "RATE_ANOMALY".cyan(), "Rate Anomaly Detector (post-pass)");
    Ok(())
}
