mod error;
mod fetcher;
mod parser;
mod settings;
mod store;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use fetcher::Fetcher;
use parser::Problem;
use settings::{Settings, StoreKind};
use store::ReplaceReport;

#[derive(Parser)]
#[command(
    name = "sheet_sync",
    about = "Scrape the DSA problem sheet and replace the stored problem list"
)]
struct Cli {
    /// Read markup from a local file instead of fetching the sheet
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,
    /// Print extracted problems as JSON lines and leave the store alone
    #[arg(long)]
    dry_run: bool,
    /// Store backend (overrides SHEET_STORE)
    #[arg(long, value_enum)]
    store: Option<StoreKind>,
    /// Sheet URL (overrides SHEET_SOURCE_URL)
    #[arg(long)]
    url: Option<String>,
    /// Target collection (overrides SHEET_COLLECTION)
    #[arg(long)]
    collection: Option<String>,
}

enum Outcome {
    Extracted(Vec<Problem>),
    Replaced(ReplaceReport),
}

// stdout carries only results; logs and progress go to stderr
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// A missing .env is fine; anything else about it is worth a warning.
fn env_file_error<T>(result: dotenvy::Result<T>) -> Option<dotenvy::Error> {
    match result {
        Err(e) if !e.not_found() => Some(e),
        _ => None,
    }
}

fn apply_overrides(cli: &Cli, settings: &mut Settings) {
    if let Some(store) = cli.store {
        settings.store = store;
    }
    if let Some(url) = &cli.url {
        settings.source_url = url.clone();
    }
    if let Some(collection) = &cli.collection {
        settings.collection = collection.clone();
    }
}

/// fetch (or read) → extract → replace, strictly in that order.
fn run(cli: &Cli, settings: &Settings) -> anyhow::Result<Outcome> {
    let markup = match &cli.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {:?}", path))?,
        None => {
            let fetcher = Fetcher::new(Duration::from_secs(settings.fetch_timeout_secs))?;
            fetcher.fetch(&settings.source_url)?
        }
    };

    let problems = parser::extract_problems(&markup)?;
    if cli.dry_run {
        return Ok(Outcome::Extracted(problems));
    }

    let store = store::open(settings)
        .with_context(|| format!("Failed to open {} store", settings.store))?;
    let report = store::replace(store.as_ref(), &settings.collection, &problems)
        .with_context(|| format!("Failed to replace collection {:?}", settings.collection))?;
    Ok(Outcome::Replaced(report))
}

fn summary(report: &ReplaceReport, store: StoreKind) -> String {
    format!(
        "{} problems inserted into {} ({} removed).",
        report.inserted, store, report.removed
    )
}

fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    init_tracing();
    if let Some(e) = env_file_error(dotenv) {
        warn!("Ignoring unreadable .env file: {}", e);
    }

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = Settings::from_env().context("Failed to load settings")?;
    apply_overrides(&cli, &mut settings);
    info!(settings = ?settings, "Starting sheet sync");

    match run(&cli, &settings)? {
        Outcome::Extracted(problems) => {
            for problem in &problems {
                println!("{}", serde_json::to_string(problem)?);
            }
            eprintln!("{} problems extracted (dry run).", problems.len());
        }
        Outcome::Replaced(report) => {
            println!("{}", summary(&report, settings.store));
            let elapsed = t0.elapsed();
            if elapsed.as_secs() >= 1 {
                println!("Done in {}", format_duration(elapsed));
            }
        }
    }
    Ok(())
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
