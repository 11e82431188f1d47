//! CLI entry point for the data cleaning service client.

use anyhow::{Result, anyhow};
use clap::Parser;
use datascrub::render::{html, text};
use datascrub::{
    AnalysisOutcome, CancellationToken, ClientConfig, DatascrubError, PipelineController,
    PipelineEvent, PipelineSnapshot, UploadFile,
};
use dotenv::dotenv;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Client for the data cleaning service",
    long_about = "Uploads a data file to the cleaning service, shows the detected issues \
                  and optionally cleans and downloads the result.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  DATASCRUB_BASE_URL       Service address (default http://127.0.0.1:5000)\n  \
                  DATASCRUB_TIMEOUT_SECS   Timeout for each request (default 60)\n  \
                  DATASCRUB_DOWNLOAD_DIR   Where cleaned files are saved (default ./downloads)\n\n\
                  EXAMPLES:\n  \
                  # Review issues only\n  \
                  datascrub -i data.csv\n\n  \
                  # Clean and download without asking\n  \
                  datascrub -i data.csv --yes --download-dir out/\n\n  \
                  # Machine-readable output\n  \
                  datascrub -i data.csv --json | jq .report.total_issue_count"
)]
struct Args {
    /// Path to the file to upload (csv, xlsx, pdf, sql)
    #[arg(short, long)]
    input: String,

    /// Base URL of the cleaning service
    ///
    /// Overrides DATASCRUB_BASE_URL
    #[arg(short, long)]
    server: Option<String>,

    /// Clean the data without asking when issues are found
    ///
    /// Without this flag the run stops after the issue review
    #[arg(short, long)]
    yes: bool,

    /// Request "before" plots for the uploaded file
    #[arg(long)]
    visualize: bool,

    /// Directory the cleaned file is saved into
    ///
    /// Overrides DATASCRUB_DOWNLOAD_DIR
    #[arg(short, long)]
    download_dir: Option<PathBuf>,

    /// Clean the data but do not download the result
    #[arg(long)]
    no_download: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON summary.
    #[arg(long)]
    json: bool,

    /// Write an HTML fragment of the report and results to this file
    #[arg(long)]
    html: Option<PathBuf>,

    /// Timeout for each request in seconds
    ///
    /// Overrides DATASCRUB_TIMEOUT_SECS
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Ask the service's assistant a question about the uploaded file
    #[arg(long)]
    ask: Option<String>,
}

/// Everything printed with `--json`.
#[derive(Debug, Serialize)]
struct RunSummary {
    input: String,
    #[serde(flatten)]
    snapshot: PipelineSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    downloaded_to: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assistant_reply: Option<String>,
    /// Failures of optional steps (plots, download, assistant).
    warnings: Vec<DatascrubError>,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Environment first, flags on top.
fn build_config(args: &Args) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env()?;

    if let Some(ref server) = args.server {
        config.base_url = server.trim_end_matches('/').to_string();
    }
    if let Some(secs) = args.timeout {
        config.timeout_secs = secs;
    }
    if let Some(ref dir) = args.download_dir {
        config.download_dir = dir.clone();
    }

    config.validate()?;
    Ok(config)
}

fn log_event(event: &PipelineEvent) {
    match event {
        PipelineEvent::Busy { label: Some(label) } => info!("{}", label),
        PipelineEvent::StateChanged { from, to } => debug!("State: {} -> {}", from, to),
        PipelineEvent::CleanData { message } => info!("{}", message),
        PipelineEvent::PlotsAdded { urls } => info!("Received {} plots", urls.len()),
        PipelineEvent::Downloaded { path } => info!("Saved {}", path.display()),
        _ => {}
    }
}

/// First Ctrl-C cancels the run, a second one exits immediately.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("Interrupted, cancelling request... (press Ctrl-C again to exit)");
        token.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
}

/// Optional steps only warn, unless the run was cancelled.
fn optional_step<T>(
    result: Result<T, DatascrubError>,
    warnings: &mut Vec<DatascrubError>,
) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_cancelled() => {
            error!("{}", e);
            Err(anyhow!(e))
        }
        Err(e) => {
            warnings.push(e);
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    // Load environment variables from .env file
    dotenv().ok();

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let config = build_config(&args)?;
    info!("Using cleaning service at {}", config.base_url);

    let token = CancellationToken::new();
    cancel_on_ctrl_c(token.clone());

    let mut controller = PipelineController::builder()
        .config(config)
        .cancellation_token(token)
        .on_event(log_event)
        .build()?;

    let file = UploadFile::from_path(&args.input).await?;
    let analysis = controller.submit_upload(file).await.map_err(|e| {
        error!("{}", e);
        anyhow!(e)
    })?;

    let mut summary = RunSummary {
        input: args.input.clone(),
        snapshot: PipelineSnapshot::default(),
        downloaded_to: None,
        assistant_reply: None,
        warnings: Vec::new(),
    };

    if args.visualize {
        optional_step(controller.request_visualization().await, &mut summary.warnings)?;
    }

    match &analysis {
        AnalysisOutcome::IssuesFound(report) if args.yes => {
            if !args.json {
                print!("{}", text::report(report));
            }
            controller.confirm_process().await.map_err(|e| {
                error!("{}", e);
                anyhow!(e)
            })?;

            if !args.no_download {
                summary.downloaded_to =
                    optional_step(controller.download_result(None).await, &mut summary.warnings)?;
            }
        }
        AnalysisOutcome::IssuesFound(report) => {
            if !args.json {
                print!("{}", text::report(report));
                println!();
                println!("Run again with --yes to clean the data");
            }
        }
        AnalysisOutcome::Clean => {
            if !args.json {
                println!("{}", datascrub::pipeline::CLEAN_DATA_MESSAGE);
            }
        }
    }

    if let Some(ref question) = args.ask {
        summary.assistant_reply =
            optional_step(controller.ask_assistant(question).await, &mut summary.warnings)?;
    }

    summary.snapshot = controller.snapshot();

    if let Some(ref path) = args.html {
        tokio::fs::write(path, html::snapshot(&summary.snapshot)).await?;
        info!("HTML written to {}", path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_human_readable_summary(&summary);
    Ok(())
}

/// Print results after the issue review.
///
/// Uses `println!` intentionally: this is the primary output and must be
/// visible regardless of log level.
fn print_human_readable_summary(summary: &RunSummary) {
    let snapshot = &summary.snapshot;

    if let Some(ref outcome) = snapshot.outcome {
        println!();
        print!("{}", text::outcome(outcome));
    }
    if let Some(ref path) = summary.downloaded_to {
        println!("Saved to: {}", path.display());
    }

    if !snapshot.gallery.is_empty() {
        println!();
        println!("Plots:");
        for url in &snapshot.gallery {
            println!("  - {}", url);
        }
    }

    if let Some(ref reply) = summary.assistant_reply {
        println!();
        println!("Assistant: {}", reply);
    }

    if !summary.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  ! {}", warning);
        }
    }
}
