//! Repository scan command: wires the GitHub client, the OpenAI provider,
//! console progress, and ctrl-c cancellation into one pipeline run.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use kansa_scanner::{
    FileOutcome, GitHubClient, LogSink, OpenAIProvider, ProgressSink, ScanConfig, ScanEngine,
    ScanEvent, ScanReport,
};

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Repository to scan: a github.com URL or a bare owner/name reference.
    #[arg(value_name = "REPO")]
    pub repo: String,

    /// Optional YAML config file; flags below override its values.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Concurrency ceiling for in-flight file analyses.
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Write the JSON report to a file in addition to stdout output.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub async fn execute(args: ScanArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => ScanConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ScanConfig::default(),
    };
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(model) = &args.model {
        config.model = model.clone();
    }

    let repo = Arc::new(GitHubClient::new(
        config.github_api_base.clone(),
        config.resolved_github_token(),
        Duration::from_secs(config.timeout_seconds),
    ));
    let provider = Arc::new(
        OpenAIProvider::from_config(&config)
            .context("failed to initialize the OpenAI provider")?,
    );

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\n{}", "Cancelling scan...".yellow());
                cancel.cancel();
            }
        });
    }

    // In JSON mode stdout must stay machine-readable, so progress goes
    // through tracing (visible with --verbose) instead of stderr chatter.
    let sink: Arc<dyn ProgressSink> = match args.format {
        OutputFormat::Json => Arc::new(LogSink),
        OutputFormat::Text => Arc::new(ConsoleSink),
    };

    let started = Instant::now();
    let engine = ScanEngine::new(repo, provider, config);
    let report = engine.scan(&args.repo, sink, cancel).await?;
    let elapsed = started.elapsed();

    if let Some(path) = &args.output {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        eprintln!("Report written to {}", path.display());
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_summary(&report, elapsed),
    }

    Ok(())
}

fn print_summary(report: &ScanReport, elapsed: Duration) {
    println!();
    println!("{}", "=".repeat(60).bright_blue());
    println!(
        "{} {} ({} files, {:.1}s)",
        "Scan complete:".bright_blue().bold(),
        report.repo_name.bold(),
        report.total_files,
        elapsed.as_secs_f64()
    );
    println!("{}", "=".repeat(60).bright_blue());

    let mut paths: Vec<&String> = report.outcomes.keys().collect();
    paths.sort();

    for path in paths {
        match &report.outcomes[path] {
            FileOutcome::Success { bugs, .. } if bugs.is_empty() => {}
            FileOutcome::Success { bugs, .. } => {
                println!("\n{} {}", path.bold(), format!("({} bugs)", bugs.len()).red());
                for bug in bugs {
                    println!(
                        "  {} {} {}",
                        format!("[{}-{}]", bug.lines.start, bug.lines.end).yellow(),
                        bug.title.bold(),
                        format!("({})", bug.id).dimmed()
                    );
                    println!("      {}", bug.description);
                }
            }
            FileOutcome::Failure { message, .. } => {
                println!("\n{} {}", path.bold(), "analysis failed".red());
                println!("      {}", message.dimmed());
            }
        }
    }

    println!();
    let failures = report.failure_count();
    println!(
        "{} bugs across {} files; {} succeeded, {}",
        report.total_bugs().to_string().bold(),
        report.total_files,
        report.success_count(),
        if failures == 0 {
            "0 failed".green().to_string()
        } else {
            format!("{failures} failed").red().to_string()
        }
    );
}

/// Human-facing progress on stderr; stdout is reserved for the report.
struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn emit(&self, event: ScanEvent) {
        match event {
            ScanEvent::ScanStarted { message } => eprintln!("{}", message.bright_blue()),
            ScanEvent::FilesDiscovered { count } => eprintln!(
                "Found {} code files. Starting security analysis...",
                count.to_string().bold()
            ),
            ScanEvent::FileStarted { path, index, total } => {
                eprintln!("{} {path}", format!("[{index}/{total}]").dimmed())
            }
            ScanEvent::FileCompleted { outcome } => match outcome {
                FileOutcome::Success { path, bugs } if bugs.is_empty() => {
                    eprintln!("  {} {path}", "ok".green())
                }
                FileOutcome::Success { path, bugs } => {
                    eprintln!("  {} {path}: {} bug(s)", "!!".red().bold(), bugs.len())
                }
                FileOutcome::Failure { path, message, .. } => {
                    eprintln!("  {} {path}: {message}", "err".red())
                }
            },
            ScanEvent::ScanCompleted {
                repo_name,
                total_files,
            } => eprintln!(
                "{}",
                format!("Analysis complete for {repo_name} ({total_files} files)").green()
            ),
            ScanEvent::ScanFailed { error } => {
                eprintln!("{}", format!("Analysis failed: {error}").red().bold())
            }
        }
    }
}
