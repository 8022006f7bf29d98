use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
use commands::{analyze::AnalyzeArgs, scan::ScanArgs};

#[derive(Parser)]
#[command(name = "logward")]
#[command(about = "Two-pass security analysis for server and application logs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the deterministic fast pass over a log file.
    Scan(ScanArgs),

    /// Run a full analysis job: fast pass plus the external analyzer.
    Analyze(AnalyzeArgs),

    /// List the detector families and their categories.
    Detectors,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => commands::scan::execute(args),
        Commands::Analyze(args) => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(commands::analyze::execute(args))
        }
        Commands::Detectors => commands::list_detectors(),
    }
}
