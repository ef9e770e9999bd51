//! Triage CLI
//!
//! Reads Kubernetes resource snapshots, detects workload faults and prints a
//! diagnosis for each affected resource.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use triage::completion::{ChatCompletionClient, CompletionBackend, DisabledBackend};
use triage::report::{format_faults_text, format_report_text};
use triage::source::{ContextSource, DirectoryContextSource, NoContext};
use triage::{detect_all, load_snapshots, DiagnosisCache, Diagnoser, TriageConfig};

/// Workload fault triage - detects, correlates and diagnoses Kubernetes failures
#[derive(Parser)]
#[command(name = "triage")]
#[command(about = "Workload fault triage - detects, correlates and diagnoses Kubernetes failures")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(long, short, global = true, env = "TRIAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Output format (json or text)
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    Json,
    #[default]
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect, correlate and diagnose faults in a snapshot file
    Scan {
        /// JSON file with a resource array, a List, or a single resource
        #[arg(long, short)]
        input: PathBuf,

        /// Directory with captured `<namespace>/<Kind>/<name>.log` and `.events.json` files
        #[arg(long)]
        context_dir: Option<PathBuf>,

        /// Skip the completion backend and use static remediation only
        #[arg(long)]
        offline: bool,
    },

    /// Only detect faults, without diagnosis
    Detect {
        /// JSON file with a resource array, a List, or a single resource
        #[arg(long, short)]
        input: PathBuf,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("triage=debug,info")
        } else {
            EnvFilter::new("triage=info,warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Scan {
            input,
            context_dir,
            offline,
        } => {
            let mut config = TriageConfig::load(cli.config.as_deref())
                .context("Failed to load configuration")?;
            if offline {
                config.completion.enabled = false;
            }

            let snapshots = load_snapshots(&input)
                .with_context(|| format!("Failed to load snapshots from {}", input.display()))?;
            debug!(count = snapshots.len(), "Loaded snapshots");

            let backend: Arc<dyn CompletionBackend> = if config.completion.enabled {
                Arc::new(
                    ChatCompletionClient::from_settings(&config.completion)
                        .context("Failed to create completion client")?,
                )
            } else {
                info!("Completion disabled, using static remediation");
                Arc::new(DisabledBackend)
            };
            let source: Arc<dyn ContextSource> = match context_dir {
                Some(dir) => Arc::new(DirectoryContextSource::new(dir)),
                None => Arc::new(NoContext),
            };
            let cache = Arc::new(DiagnosisCache::with_ttl(config.cache.ttl()?));

            let diagnoser = Diagnoser::new(backend, source, cache, config);
            let report = diagnoser.scan(&snapshots).await;

            match cli.format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Text => print!("{}", format_report_text(&report)),
            }
        }

        Commands::Detect { input } => {
            let snapshots = load_snapshots(&input)
                .with_context(|| format!("Failed to load snapshots from {}", input.display()))?;
            let faults = detect_all(&snapshots);

            match cli.format {
                OutputFormat::Json => print_json(&faults)?,
                OutputFormat::Text => {
                    println!(
                        "{}",
                        format!("Examined {} resources", snapshots.len()).cyan()
                    );
                    print!("{}", format_faults_text(&faults));
                }
            }
        }
    }

    Ok(())
}
