//! Wiki-Ripple main entry point
//!
//! This is the command-line interface for the Wiki-Ripple word-frequency
//! crawler.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use wiki_ripple::config::{load_config_with_hash, validate, Config};
use wiki_ripple::crawler::{build_traverser, FailureKind, TraversalResult};
use wiki_ripple::frequency::{calculate, sorted_by_count, FrequencyTable, WordFrequency};

/// Wiki-Ripple: recursive Wikipedia word-frequency crawler
///
/// Wiki-Ripple fetches an article, follows its links up to the given depth,
/// and reports how often each word occurs across every page it reached.
#[derive(Parser, Debug)]
#[command(name = "wiki-ripple")]
#[command(version)]
#[command(about = "Recursive Wikipedia word-frequency crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Word frequencies over an article and its linked articles
    WordFrequency {
        #[command(flatten)]
        traversal: TraversalArgs,
    },

    /// Most frequent words, with optional ignore list and percentile cutoff
    Keywords {
        #[command(flatten)]
        traversal: TraversalArgs,

        /// Comma-separated words to exclude
        #[arg(long, value_delimiter = ',')]
        ignore: Vec<String>,

        /// Keep only words above this frequency percentile (0-100)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        percentile: Option<u8>,
    },

    /// Validate and print the effective configuration
    ShowConfig,
}

#[derive(clap::Args, Debug)]
struct TraversalArgs {
    /// Title of the start article
    #[arg(long)]
    article: String,

    /// Link hops to follow from the start article
    #[arg(long)]
    depth: u32,

    /// Abort the traversal after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

/// Outward result of a traversal command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Success,
    /// No text and no errors: the article does not exist
    NotFound,
    /// No text, and at least one page failed
    UpstreamFailure,
    TimedOut,
}

impl Status {
    fn exit_code(self) -> ExitCode {
        match self {
            Status::Success => ExitCode::SUCCESS,
            Status::NotFound => ExitCode::from(2),
            Status::UpstreamFailure => ExitCode::from(3),
            Status::TimedOut => ExitCode::from(4),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(status) => status.exit_code(),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<Status> {
    let (config, config_hash) = load(cli.config.as_deref())?;

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet, &config.logging.level);

    match &config_hash {
        Some(hash) => tracing::info!("Configuration loaded successfully (hash: {})", hash),
        None => tracing::info!("No configuration file given, using defaults"),
    }

    match cli.command {
        Command::ShowConfig => {
            handle_show_config(&config);
            Ok(Status::Success)
        }
        Command::WordFrequency { traversal } => {
            handle_frequency(&config, &traversal, None, None).await
        }
        Command::Keywords {
            traversal,
            ignore,
            percentile,
        } => {
            let ignore = (!ignore.is_empty()).then_some(ignore);
            handle_frequency(&config, &traversal, ignore.as_deref(), percentile).await
        }
    }
}

/// Loads the configuration file, or validated defaults when none is given
fn load(path: Option<&Path>) -> anyhow::Result<(Config, Option<String>)> {
    match path {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            Ok((config, Some(hash)))
        }
        None => {
            let config = Config::default();
            validate(&config).context("Default configuration is invalid")?;
            Ok((config, None))
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG`, when set, replaces the computed filter.
fn setup_logging(verbose: u8, quiet: bool, level: &str) {
    let directives = if quiet {
        // Only show errors
        "error".to_string()
    } else {
        match verbose {
            0 => format!("wiki_ripple={},warn", level.to_lowercase()),
            1 => "wiki_ripple=debug,info".to_string(),
            2 => "wiki_ripple=trace,debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    // Logs go to stderr; stdout carries the JSON result
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the show-config command: prints the effective configuration
fn handle_show_config(config: &Config) {
    println!("=== Wiki-Ripple Configuration ===\n");

    println!("Crawler:");
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    println!(
        "  Max requests per second: {}",
        config.crawler.max_requests_per_second
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.user_agent());

    println!("\nHTTP:");
    println!("  Connect timeout: {}s", config.http.connect_timeout);
    println!("  Request timeout: {}s", config.http.request_timeout);
    println!("  Pool idle timeout: {}s", config.http.pool_idle_timeout);

    println!("\nRetry:");
    println!("  Max attempts: {}", config.retry.max_attempts);
    println!(
        "  Backoff: {}s to {}s, x{}",
        config.retry.min_wait, config.retry.max_wait, config.retry.multiplier
    );
    println!("  Retry-After jitter: up to {}s", config.retry.jitter_max);

    println!("\nSource:");
    println!("  Kind: {:?}", config.source.kind);
    println!("  API endpoint: {}", config.source.api_endpoint);
    println!("  Site URL: {}", config.source.site_url);

    println!("\nLogging:");
    println!("  Level: {}", config.logging.level);

    println!("\n✓ Configuration is valid");
}

/// Handles the word-frequency and keywords commands
async fn handle_frequency(
    config: &Config,
    args: &TraversalArgs,
    ignore: Option<&[String]>,
    percentile: Option<u8>,
) -> anyhow::Result<Status> {
    let traverser = build_traverser(config).context("Failed to set up page source")?;
    let traversal = traverser.traverse(&args.article, args.depth);

    let result = match args.timeout {
        Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), traversal).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    "Traversal from '{}' timed out after {}s",
                    args.article,
                    secs
                );
                return Ok(Status::TimedOut);
            }
        },
        None => traversal.await,
    };

    let status = classify(&result);
    match status {
        Status::NotFound => {
            tracing::error!("Article not found: {}", args.article);
            return Ok(status);
        }
        Status::UpstreamFailure => {
            report_failures(&args.article, &result);
            return Ok(status);
        }
        Status::Success | Status::TimedOut => {}
    }

    if !result.errors.is_empty() {
        tracing::warn!(
            "{} of {} visited pages failed; frequencies use partial text",
            result.errors.len(),
            result.visited.len()
        );
    }

    let table = calculate(&result.texts, ignore, percentile);
    println!("{}", render(&table)?);

    Ok(Status::Success)
}

/// Maps a finished traversal to its outward status
fn classify(result: &TraversalResult) -> Status {
    if !result.texts.is_empty() {
        Status::Success
    } else if result.errors.is_empty() {
        Status::NotFound
    } else {
        Status::UpstreamFailure
    }
}

fn report_failures(article: &str, result: &TraversalResult) {
    let transient = result
        .errors
        .iter()
        .any(|error| error.kind == FailureKind::Recoverable);

    tracing::error!(
        "No text collected from '{}': upstream {}",
        article,
        if transient { "unavailable" } else { "rejected the request" }
    );
    for error in &result.errors {
        tracing::error!("  {} ({:?}): {}", error.title, error.kind, error.error);
    }
}

/// Renders the table as pretty JSON, most frequent words first in logs
fn render(table: &FrequencyTable) -> anyhow::Result<String> {
    for (word, frequency) in sorted_by_count(table).into_iter().take(10) {
        tracing::debug!("{:>8} {:6.2}% {}", frequency.count, frequency.percentage, word);
    }

    let ordered: BTreeMap<&str, &WordFrequency> = table
        .iter()
        .map(|(word, frequency)| (word.as_str(), frequency))
        .collect();

    serde_json::to_string_pretty(&ordered).context("Failed to serialize frequencies")
}
