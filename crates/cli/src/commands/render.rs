//! Report rendering shared by the scan and analyze commands.

use anyhow::Result;
use colored::*;
use logward_scanners::core::{RawFinding, Severity, SeverityCounts};
use logward_scanners::normalize::LogFormat;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("unknown output format: {s}")),
        }
    }
}

pub fn parse_severity(s: &str) -> Result<Severity> {
    match s.to_lowercase().as_str() {
        "critical" => Ok(Severity::Critical),
        "high" => Ok(Severity::High),
        "medium" => Ok(Severity::Medium),
        "low" => Ok(Severity::Low),
        "info" | "informational" => Ok(Severity::Info),
        _ => Err(anyhow::anyhow!("invalid severity: {s}")),
    }
}

#[derive(Debug, Default)]
pub struct ReportMeta {
    pub input: String,
    pub detected_format: Option<LogFormat>,
    pub lines_processed: u64,
    pub lines_skipped: u64,
    pub overall_summary: Option<String>,
    pub degraded_note: Option<String>,
}

pub fn render(format: OutputFormat, findings: &[RawFinding], meta: &ReportMeta) -> Result<String> {
    match format {
        OutputFormat::Text => render_text(findings, meta),
        OutputFormat::Json => render_json(findings, meta),
        OutputFormat::Markdown => render_markdown(findings, meta),
    }
}

fn counts(findings: &[RawFinding]) -> SeverityCounts {
    let mut counts = SeverityCounts::default();
    for finding in findings {
        counts.add(finding.severity);
    }
    counts
}

fn render_text(findings: &[RawFinding], meta: &ReportMeta) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "{}", "════════════════════════════════════════".bright_blue())?;
    writeln!(out, "{}", "       SECURITY FINDINGS REPORT".bright_blue().bold())?;
    writeln!(out, "{}", "════════════════════════════════════════".bright_blue())?;
    writeln!(out, "Input: {}", meta.input)?;
    if let Some(format) = meta.detected_format {
        writeln!(
            out,
            "Format: {}  •  {} lines processed, {} skipped",
            format, meta.lines_processed, meta.lines_skipped
        )?;
    }
    if let Some(note) = &meta.degraded_note {
        writeln!(out, "{} {}", "⚠".yellow(), note.yellow())?;
    }
    if let Some(summary) = &meta.overall_summary {
        writeln!(out, "\n{} {}", "Summary:".bold(), summary)?;
    }

    if findings.is_empty() {
        writeln!(out, "\n{}", "✨ No findings.".green())?;
        return Ok(out);
    }

    for severity in [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ] {
        let bucket: Vec<_> = findings.iter().filter(|f| f.severity == severity).collect();
        if bucket.is_empty() {
            continue;
        }

        let badge = match severity {
            Severity::Critical => "CRITICAL".red().bold(),
            Severity::High => "HIGH".bright_red(),
            Severity::Medium => "MEDIUM".yellow(),
            Severity::Low => "LOW".bright_yellow(),
            Severity::Info => "INFO".bright_blue(),
        };
        writeln!(out, "\n{} {} ({})", "▶".bright_white(), badge, bucket.len())?;
        writeln!(out, "{}", "─".repeat(40).bright_black())?;

        for finding in bucket {
            writeln!(out, "\n  {} {}", "•".bright_white(), finding.title.bold())?;
            let source_tag = match finding.source {
                logward_scanners::FindingSource::Fast => "[fast]".bright_green(),
                logward_scanners::FindingSource::Slow => "[slow]".bright_cyan(),
            };
            write!(out, "    {} {}", source_tag, finding.category.to_string().cyan())?;
            if let Some(line) = finding.line_number {
                write!(out, "  line {line}")?;
            }
            if let Some(confidence) = finding.confidence {
                write!(out, "  confidence {:.0}%", confidence * 100.0)?;
            }
            writeln!(out)?;
            writeln!(out, "    {}", finding.description.bright_black())?;
            if let Some(content) = &finding.line_content {
                writeln!(out, "    {} {}", "evidence:".bright_black(), content.trim())?;
            }
            if let Some(rec) = &finding.recommendation {
                writeln!(out, "    {} {}", "fix:".green(), rec)?;
            }
        }
    }

    Ok(out)
}

fn render_json(findings: &[RawFinding], meta: &ReportMeta) -> Result<String> {
    #[derive(serde::Serialize)]
    struct Report<'a> {
        input: &'a str,
        detected_format: Option<LogFormat>,
        lines_processed: u64,
        lines_skipped: u64,
        overall_summary: Option<&'a str>,
        severity_counts: SeverityCounts,
        findings: &'a [RawFinding],
    }

    let report = Report {
        input: &meta.input,
        detected_format: meta.detected_format,
        lines_processed: meta.lines_processed,
        lines_skipped: meta.lines_skipped,
        overall_summary: meta.overall_summary.as_deref(),
        severity_counts: counts(findings),
        findings,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn render_markdown(findings: &[RawFinding], meta: &ReportMeta) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "# Security Findings Report\n")?;
    writeln!(out, "**Input:** `{}`", meta.input)?;
    writeln!(out, "**Date:** {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    if let Some(format) = meta.detected_format {
        writeln!(
            out,
            "**Format:** {format}, {} lines processed, {} skipped",
            meta.lines_processed, meta.lines_skipped
        )?;
    }
    if let Some(summary) = &meta.overall_summary {
        writeln!(out, "\n> {summary}")?;
    }

    let totals = counts(findings);
    writeln!(out, "\n## Summary\n")?;
    writeln!(out, "| Severity | Count |")?;
    writeln!(out, "|----------|-------|")?;
    for (label, count) in [
        ("CRITICAL", totals.critical),
        ("HIGH", totals.high),
        ("MEDIUM", totals.medium),
        ("LOW", totals.low),
        ("INFO", totals.info),
    ] {
        if count > 0 {
            writeln!(out, "| {label} | {count} |")?;
        }
    }

    writeln!(out, "\n## Findings")?;
    for (i, finding) in findings.iter().enumerate() {
        writeln!(
            out,
            "\n### {}. {} {} {}",
            i + 1,
            finding.severity.emoji(),
            finding.severity,
            finding.title
        )?;
        writeln!(out, "\n**Category:** {}", finding.category)?;
        if let Some(line) = finding.line_number {
            writeln!(out, "**Line:** {line}")?;
        }
        if let Some(confidence) = finding.confidence {
            writeln!(out, "**Confidence:** {:.0}%", confidence * 100.0)?;
        }
        if let (Some(tactic), Some(technique)) = (&finding.mitre_tactic, &finding.mitre_technique) {
            writeln!(out, "**MITRE:** {tactic} / {technique}")?;
        }
        writeln!(out, "\n{}", finding.description)?;
        if let Some(content) = &finding.line_content {
            writeln!(out, "\n```\n{}\n```", content.trim())?;
        }
        if let Some(rec) = &finding.recommendation {
            writeln!(out, "\n**Recommendation:** {rec}")?;
        }
    }

    Ok(out)
}
