//! Fast pass only: stream a file through the scan engine and print the
//! ranked findings.

use crate::commands::render::{parse_severity, render, OutputFormat, ReportMeta};
use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use logward_scanners::core::sort_findings;
use logward_scanners::ScanEngine;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Args, Debug)]
pub struct ScanArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    #[arg(short = 's', long, default_value = "info")]
    pub min_severity: String,

    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(short, long)]
    pub verbose: bool,
}

pub fn execute(args: ScanArgs) -> Result<()> {
    let start = Instant::now();
    let min_severity = parse_severity(&args.min_severity)?;

    let file = File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;

    let outcome = ScanEngine::new().run(BufReader::new(file))?;

    let mut findings = outcome.findings;
    findings.retain(|f| f.severity >= min_severity);
    sort_findings(&mut findings);

    let meta = ReportMeta {
        input: args.input.display().to_string(),
        detected_format: Some(outcome.detected_format),
        lines_processed: outcome.lines_processed,
        lines_skipped: outcome.lines_skipped,
        overall_summary: None,
        degraded_note: None,
    };
    let rendered = render(args.format, &findings, &meta)?;

    match args.output {
        Some(path) => std::fs::write(path, rendered)?,
        None => println!("{rendered}"),
    }

    if args.verbose {
        eprintln!(
            "{} {} findings in {:.2}s ({} normalization errors)",
            "done:".green().bold(),
            findings.len(),
            start.elapsed().as_secs_f64(),
            outcome.normalization_errors
        );
    }

    Ok(())
}
