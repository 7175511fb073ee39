//! # linkvault CLI
//!
//! Command-line front end for the link archive pipeline.
//!
//! - `convert`: fetch one link and write it as a markdown note
//! - `crawl`: check a list of saved links in checkpointed batches
//! - `normalize`: print the canonical form of URLs
//! - `score`: compute a quality score from fetch signals
//!
//! Logging goes to stderr and is filtered with `RUST_LOG`. Crawls also log to
//! a file next to their checkpoints.

mod telemetry;

use anyhow::anyhow;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use linkvault::crawler::{BatchCrawler, CrawlJob, CrawlerConfig};
use linkvault::extractor::ExtractMode;
use linkvault::fetcher::{Fetcher, FetcherConfig};
use linkvault::markdown::LinkMetadata;
use linkvault::pipeline::{ConvertOptions, Converter, write_markdown};
use linkvault::{normalize, quality};
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

#[derive(Parser)]
#[command(author, version, about = "Archive saved links as frontmatter-annotated markdown", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch a URL and convert it to a markdown note
    Convert(ConvertArgs),

    /// Check a list of saved links in checkpointed batches
    Crawl(CrawlArgs),

    /// Print the normalized form of each URL
    Normalize(NormalizeArgs),

    /// Compute a quality score from fetch signals
    Score(ScoreArgs),
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// URL to convert
    #[arg(required = true)]
    url: String,

    /// Extraction method (auto|structured|heuristic)
    #[arg(short, long, default_value = "auto")]
    method: ExtractMode,

    /// Write the note to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Tag for the note (repeatable)
    #[arg(short, long = "tag")]
    tags: Vec<String>,

    /// Title saved with the link
    #[arg(long)]
    title: Option<String>,

    /// Author saved with the link
    #[arg(long)]
    author: Option<String>,

    /// Domain of the link
    #[arg(long)]
    domain: Option<String>,

    /// Read-later status of the link
    #[arg(long)]
    pocket_status: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Omit the frontmatter block
    #[arg(long)]
    no_frontmatter: bool,
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// JSON file with a list of `{index, url, title}` jobs
    #[arg(required = true)]
    jobs: PathBuf,

    /// Number of concurrent requests
    #[arg(short, long, default_value = "5")]
    workers: usize,

    /// Jobs per checkpointed batch
    #[arg(short, long, default_value = "100")]
    batch_size: usize,

    /// Minimum pause before each request, in seconds
    #[arg(long, default_value = "1")]
    min_delay: f64,

    /// Maximum pause before each request, in seconds
    #[arg(long, default_value = "3")]
    max_delay: f64,

    /// Directory for checkpoints and the crawl log
    #[arg(long, default_value = "logs")]
    checkpoint_dir: PathBuf,

    /// Write all records of this run to this file
    #[arg(short, long, default_value = "results.json")]
    output: PathBuf,

    /// Skip jobs already present in checkpoints
    #[arg(long)]
    resume: bool,

    /// Global cap on requests per second
    #[arg(long)]
    max_rps: Option<NonZeroU32>,

    /// Retries for transient failures
    #[arg(long, default_value = "3")]
    retries: u32,
}

#[derive(Args, Debug)]
struct NormalizeArgs {
    /// URLs to normalize
    #[arg(required = true)]
    urls: Vec<String>,
}

#[derive(Args, Debug)]
struct ScoreArgs {
    /// HTTP status of the final response
    #[arg(long)]
    status: Option<u16>,

    /// Redirects followed
    #[arg(long, default_value = "0")]
    redirects: u32,

    /// Content was extracted
    #[arg(long)]
    has_content: bool,

    /// Markdown was produced
    #[arg(long)]
    has_markdown: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The crawl log lives next to the checkpoints; the guard must outlive the run
    let _guard = match &cli.command {
        Commands::Crawl(args) => Some(telemetry::init_crawl_logging(&args.checkpoint_dir)?),
        _ => {
            telemetry::init_tracing_subscriber();
            None
        }
    };

    match cli.command {
        Commands::Convert(args) => convert_command(args).await?,
        Commands::Crawl(args) => crawl_command(args).await?,
        Commands::Normalize(args) => {
            for url in &args.urls {
                println!("{}", normalize::normalize(url));
            }
        }
        Commands::Score(args) => {
            println!(
                "{}",
                quality::score(args.status, args.redirects, args.has_content, args.has_markdown)
            );
        }
    }

    Ok(())
}

#[instrument]
async fn convert_command(args: ConvertArgs) -> anyhow::Result<()> {
    let fetcher = Fetcher::new(
        FetcherConfig::builder()
            .timeout(Duration::from_secs(args.timeout))
            .build(),
    )?;
    let converter = Converter::new(fetcher);

    let options = ConvertOptions {
        mode: args.method,
        include_frontmatter: !args.no_frontmatter,
    };
    let metadata = LinkMetadata {
        title: args.title,
        tags: args.tags,
        date_saved: Some(Utc::now()),
        domain: args.domain,
        pocket_status: args.pocket_status,
        author: args.author,
        ..Default::default()
    };

    let conversion = converter
        .convert(&args.url, &options, &metadata)
        .await
        .map_err(|failure| anyhow!("Conversion failed: {}", failure))?;

    info!(
        final_url = %conversion.fetch.final_url,
        method = %conversion.article.method,
        score = conversion.quality.score,
        "Conversion finished"
    );

    match args.output {
        Some(path) => {
            write_markdown(&conversion, &path).await?;
            println!("Saved {} to {}", conversion.fetch.final_url, path.display());
        }
        None => print!("{}", conversion.markdown()),
    }

    Ok(())
}

#[instrument]
async fn crawl_command(args: CrawlArgs) -> anyhow::Result<()> {
    let json = tokio::fs::read_to_string(&args.jobs).await?;
    let jobs: Vec<CrawlJob> = serde_json::from_str(&json)?;

    let config = CrawlerConfig::builder()
        .workers(args.workers)
        .batch_size(args.batch_size)
        .delay_range(
            Duration::try_from_secs_f64(args.min_delay)?,
            Duration::try_from_secs_f64(args.max_delay)?,
        )
        .max_retries(args.retries)
        .max_requests_per_second(args.max_rps)
        .checkpoint_dir(args.checkpoint_dir.clone())
        .build();

    // Create a channel for progress updates
    let (progress_sender, mut progress_receiver) = mpsc::unbounded_channel();
    let crawler = BatchCrawler::new(Fetcher::with_defaults()?, config)?.with_progress(progress_sender);

    let jobs = if args.resume {
        let pending = crawler.pending_jobs(jobs).await?;
        println!("Resuming with {} pending links", pending.len());
        pending
    } else {
        jobs
    };

    let progress_bar = ProgressBar::new(jobs.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")?
            .progress_chars("##-"),
    );
    progress_bar.set_message("Crawling links...");

    let progress_handle = tokio::spawn({
        let progress_bar = progress_bar.clone();
        async move {
            let mut failed = 0;
            while let Some(progress) = progress_receiver.recv().await {
                progress_bar.set_position(progress.completed as u64);
                if progress.error.is_some() {
                    failed += 1;
                }
                progress_bar.set_message(format!("{} failed", failed));
            }
            progress_bar.finish_with_message("Crawl finished");
        }
    });

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, finishing in-flight requests");
                cancel.cancel();
            }
        }
    });

    let start_time = Instant::now();
    let report = crawler.run(jobs, cancel).await?;

    // The progress task ends once the crawler drops its sender
    drop(crawler);
    if let Err(e) = progress_handle.await {
        warn!("Progress display failed: {}", e);
    }

    let records = report.records();
    tokio::fs::write(&args.output, serde_json::to_string_pretty(&records)?).await?;

    if report.cancelled {
        println!("Crawl interrupted; rerun with --resume to continue");
    }
    for (batch, reason) in &report.failed_checkpoints {
        println!("Checkpoint for batch {} was not saved: {}", batch, reason);
    }
    println!("{}", report.stats);
    println!(
        "Wrote {} records to {} in {:.2?} ({} batches checkpointed)",
        records.len(),
        args.output.display(),
        start_time.elapsed(),
        report.batches_completed
    );

    Ok(())
}
