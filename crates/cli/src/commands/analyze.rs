//! Full two-pass analysis job against an in-memory store.

use crate::commands::render::{parse_severity, render, OutputFormat, ReportMeta};
use anyhow::Result;
use clap::Args;
use colored::*;
use logward_scanners::core::sort_findings;
use logward_scanners::llm::{NoopAnalyzer, SlowPassAnalyzer};
use logward_scanners::progress::TracingSink;
use logward_scanners::runner::AnalysisOrchestrator;
use logward_scanners::source::FileSource;
use logward_scanners::store::{AnalysisJob, AnalysisStore, JobStatus, MemoryStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    #[arg(short = 's', long, default_value = "info")]
    pub min_severity: String,

    /// Skip the external analyzer even when credentials are present.
    #[arg(long)]
    pub no_llm: bool,

    #[arg(long, default_value = "gpt-4o")]
    pub model: String,

    /// Wall-clock bound on the analyzer call, in seconds.
    #[arg(long, default_value_t = 300)]
    pub timeout_secs: u64,

    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(short, long)]
    pub verbose: bool,
}

pub async fn execute(args: AnalyzeArgs) -> Result<()> {
    let min_severity = parse_severity(&args.min_severity)?;

    let analyzer: Arc<dyn SlowPassAnalyzer> = build_analyzer(&args)?;
    let store = Arc::new(MemoryStore::new());
    let orchestrator = AnalysisOrchestrator::new(
        store.clone(),
        Arc::new(FileSource),
        analyzer,
        Arc::new(TracingSink),
    )
    .with_analyzer_timeout(Duration::from_secs(args.timeout_secs));

    let job_id = format!("job-{}", chrono::Utc::now().timestamp_millis());
    let job = AnalysisJob::new(&job_id, args.input.display().to_string());
    store.save_job(&job).await?;

    if args.verbose {
        eprintln!("{} job {job_id}", "starting".cyan());
    }

    let job = orchestrator.run(&job_id).await?;

    if job.status == JobStatus::Failed {
        anyhow::bail!(
            "analysis failed: {}",
            job.error_message.as_deref().unwrap_or("unknown error")
        );
    }

    let mut findings = store.findings_for_job(&job_id).await?;
    findings.retain(|f| f.severity >= min_severity);
    sort_findings(&mut findings);

    let degraded_note = if !job.slow_pass_available {
        Some("external analyzer not configured; fast-pass results only".to_string())
    } else if !job.slow_pass_completed {
        Some("external analyzer did not complete; results may be partial".to_string())
    } else {
        None
    };

    let meta = ReportMeta {
        input: args.input.display().to_string(),
        detected_format: job.detected_format,
        lines_processed: job.lines_processed,
        lines_skipped: job.lines_skipped,
        overall_summary: job.overall_summary.clone(),
        degraded_note,
    };
    let rendered = render(args.format, &findings, &meta)?;

    match args.output {
        Some(path) => std::fs::write(path, rendered)?,
        None => println!("{rendered}"),
    }

    Ok(())
}

fn build_analyzer(args: &AnalyzeArgs) -> Result<Arc<dyn SlowPassAnalyzer>> {
    if args.no_llm {
        return Ok(Arc::new(NoopAnalyzer));
    }

    #[cfg(feature = "llm")]
    {
        use logward_scanners::llm::{LlmAnalyzer, OpenAIProvider};
        if std::env::var("OPENAI_API_KEY").is_ok() {
            let provider = Arc::new(OpenAIProvider::new(Some(args.model.clone()))?);
            return Ok(Arc::new(LlmAnalyzer::new(provider)));
        }
        eprintln!(
            "{}",
            "OPENAI_API_KEY not set; running fast pass only".yellow()
        );
    }

    #[cfg(not(feature = "llm"))]
    let _ = &args.model;

    Ok(Arc::new(NoopAnalyzer))
}
