//! # Batch Crawler Module
//!
//! This module drives a [`PageFetcher`] over a large, ordered list of saved
//! links to find out where each one ends up and whether it still works.
//!
//! ## Key Components
//!
//! - `BatchCrawler`: runs jobs in checkpointed batches on a bounded worker pool
//! - `CrawlerConfig`: batching, concurrency, politeness and retry settings
//! - `CheckpointStore`: per-batch JSON progress files used to resume a run
//! - `CrawlStats`: run-level counters
//!
//! ## Behavior
//!
//! - Jobs are split into fixed-size batches. Within a batch up to `workers`
//!   requests run at once; batch N is checkpointed before batch N+1 starts
//! - Every worker sleeps a random delay before its request
//! - Timeouts, connection errors and retryable statuses are retried with
//!   exponential backoff
//! - A failing job never aborts the run. Its failure is recorded in its
//!   outcome and counted once in the stats
//! - Neither does a checkpoint that cannot be written; the batch's outcomes
//!   stay in the report and the failure is listed there
//! - Cancellation is observed between batches and before each request.
//!   Requests already in flight finish and the partial batch is checkpointed
//!
//! ## Usage
//!
//! ```rust,no_run
//! use linkvault::crawler::{BatchCrawler, CrawlJob, CrawlerConfig};
//! use linkvault::fetcher::Fetcher;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> linkvault::Result<()> {
//! let crawler = BatchCrawler::new(Fetcher::with_defaults()?, CrawlerConfig::default())?;
//! let jobs = vec![CrawlJob::new(0, "https://example.com/", "Example")];
//! let report = crawler.run(jobs, CancellationToken::new()).await?;
//! println!("{}", report.stats);
//! # Ok(())
//! # }
//! ```

mod checkpoint;
mod config;
mod error;
mod stats;

pub use checkpoint::{CheckpointError, CheckpointStore};
pub use config::{CrawlerConfig, CrawlerConfigBuilder, DEFAULT_RETRY_STATUSES};
pub use error::CrawlError;
pub use stats::CrawlStats;

use chrono::{DateTime, Utc};
use futures::future;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use rand::{Rng, thread_rng};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, debug_span, error, info, info_span, instrument, warn};

use crate::error::{ErrorInfo, ErrorKind};
use crate::extractor::truncate_chars;
use crate::fetcher::{FetchResult, PageFetcher};

/// Characters of a job title kept in checkpoint records
const RECORD_TITLE_CHARS: usize = 50;

/// A link to crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlJob {
    /// Caller's identifier for the link, unique within a run
    pub index: usize,

    /// URL to fetch
    pub url: String,

    /// Title saved with the link
    #[serde(default)]
    pub title: String,
}

impl CrawlJob {
    /// Create a new job
    pub fn new(index: usize, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            index,
            url: url.into(),
            title: title.into(),
        }
    }
}

/// Result of crawling one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlOutcome {
    pub job: CrawlJob,
    pub result: FetchResult,

    /// When the fetch finished
    pub crawled_at: DateTime<Utc>,
}

impl CrawlOutcome {
    /// Outcome of a fetch that just finished
    pub fn new(job: CrawlJob, result: FetchResult) -> Self {
        Self {
            job,
            result,
            crawled_at: Utc::now(),
        }
    }
}

/// Body-less summary of an outcome, as written to checkpoint files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlRecord {
    pub index: usize,
    pub original_url: String,
    pub final_url: String,
    pub status_code: Option<u16>,
    pub redirect_count: u32,
    pub response_time: Option<f64>,
    pub error_type: Option<ErrorKind>,
    pub error_message: Option<String>,
    pub title: String,
    pub crawled_at: DateTime<Utc>,
}

impl From<&CrawlOutcome> for CrawlRecord {
    fn from(outcome: &CrawlOutcome) -> Self {
        let result = &outcome.result;
        Self {
            index: outcome.job.index,
            original_url: result.original_url.clone(),
            final_url: result.final_url.clone(),
            status_code: result.status_code,
            redirect_count: result.redirect_count,
            response_time: result.response_time_seconds,
            error_type: result.error_kind(),
            error_message: result.error.as_ref().map(|e| e.message.clone()),
            title: truncate_chars(&outcome.job.title, RECORD_TITLE_CHARS),
            crawled_at: outcome.crawled_at,
        }
    }
}

/// Progress notification sent as each job finishes
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlProgress {
    /// Index of the finished job
    pub index: usize,

    /// Failure kind, if the job failed
    pub error: Option<ErrorKind>,

    /// Jobs finished so far in this run
    pub completed: usize,

    /// Jobs submitted to this run
    pub total: usize,
}

/// Everything a crawl run produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// One outcome per processed job
    pub outcomes: Vec<CrawlOutcome>,

    /// Final counters
    pub stats: CrawlStats,

    /// Batches checkpointed during this run
    pub batches_completed: usize,

    /// Checkpoint files written during this run
    pub checkpoints: Vec<PathBuf>,

    /// Whether the run stopped early on cancellation
    pub cancelled: bool,

    /// Batches whose checkpoint could not be written, with the reason
    pub failed_checkpoints: Vec<(usize, String)>,
}

impl CrawlReport {
    /// Checkpoint-style records for every outcome
    pub fn records(&self) -> Vec<CrawlRecord> {
        self.outcomes.iter().map(CrawlRecord::from).collect()
    }
}

/// State shared by the workers of one run
struct RunState {
    stats: Mutex<CrawlStats>,
    completed: AtomicUsize,
    total: usize,
    progress: Option<mpsc::UnboundedSender<CrawlProgress>>,
}

impl RunState {
    /// Count a finished job; called exactly once per processed job
    fn record(&self, job: &CrawlJob, result: &FetchResult) {
        self.stats
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .record(result);
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(progress) = &self.progress {
            // a dropped receiver only means nobody is watching
            let _ = progress.send(CrawlProgress {
                index: job.index,
                error: result.error_kind(),
                completed,
                total: self.total,
            });
        }
    }

    fn snapshot(&self) -> CrawlStats {
        self.stats
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Checkpointed, concurrent crawler over a list of jobs
pub struct BatchCrawler<F: PageFetcher> {
    fetcher: Arc<F>,
    config: Arc<CrawlerConfig>,
    checkpoints: CheckpointStore,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
    progress: Option<mpsc::UnboundedSender<CrawlProgress>>,
}

impl<F: PageFetcher> BatchCrawler<F> {
    /// Create a crawler, validating the configuration
    pub fn new(fetcher: F, config: CrawlerConfig) -> Result<Self, CrawlError> {
        config.validate()?;

        let limiter = config
            .max_requests_per_second
            .map(|rps| Arc::new(RateLimiter::direct(Quota::per_second(rps))));
        let checkpoints = CheckpointStore::new(config.checkpoint_dir.clone());

        Ok(Self {
            fetcher: Arc::new(fetcher),
            config: Arc::new(config),
            checkpoints,
            limiter,
            progress: None,
        })
    }

    /// Report each finished job on `sender`
    pub fn with_progress(mut self, sender: mpsc::UnboundedSender<CrawlProgress>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// The crawler's configuration
    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// The checkpoint store this crawler writes to
    pub fn checkpoints(&self) -> &CheckpointStore {
        &self.checkpoints
    }

    /// Drop jobs already recorded in an earlier run's checkpoints
    pub async fn pending_jobs(&self, jobs: Vec<CrawlJob>) -> Result<Vec<CrawlJob>, CrawlError> {
        let done = self.checkpoints.completed_indices().await?;
        let before = jobs.len();
        let pending: Vec<CrawlJob> = jobs
            .into_iter()
            .filter(|job| !done.contains(&job.index))
            .collect();
        info!("Skipping {} already crawled jobs, {} remaining", before - pending.len(), pending.len());
        Ok(pending)
    }

    /// Crawl every job, checkpointing after each batch
    ///
    /// Job failures and checkpoint write failures are part of the report; a
    /// batch whose checkpoint cannot be written keeps its outcomes.
    #[instrument(skip_all, fields(jobs = jobs.len()))]
    pub async fn run(&self, jobs: Vec<CrawlJob>, cancel: CancellationToken) -> Result<CrawlReport, CrawlError> {
        let total = jobs.len();
        let state = Arc::new(RunState {
            stats: Mutex::new(CrawlStats::new(total)),
            completed: AtomicUsize::new(0),
            total,
            progress: self.progress.clone(),
        });
        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        let first_batch = match self.checkpoints.next_batch_number().await {
            Ok(batch) => batch,
            Err(e) => {
                warn!("Cannot list checkpoints in {}: {}", self.checkpoints.dir().display(), e);
                1
            }
        };

        info!(
            workers = self.config.workers,
            batch_size = self.config.batch_size,
            "Starting crawl of {} URLs",
            total
        );

        let mut outcomes = Vec::with_capacity(total);
        let mut checkpoints = Vec::new();
        let mut failed_checkpoints = Vec::new();
        let mut batches_run = 0;
        let mut batches_completed = 0;
        let mut cancelled = false;
        let mut remaining = jobs.into_iter();

        loop {
            let batch: Vec<CrawlJob> = remaining.by_ref().take(self.config.batch_size).collect();
            if batch.is_empty() {
                break;
            }
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let batch_number = first_batch + batches_run;
            let span = info_span!("batch", number = batch_number, size = batch.len());
            let batch_outcomes = self
                .run_batch(batch, &semaphore, &state, &cancel)
                .instrument(span)
                .await;

            if !batch_outcomes.is_empty() {
                let records: Vec<CrawlRecord> = batch_outcomes.iter().map(CrawlRecord::from).collect();
                match self.checkpoints.save(batch_number, &records).await {
                    Ok(path) => {
                        info!("Batch {} complete: {} URLs processed, progress saved to {}", batch_number, records.len(), path.display());
                        checkpoints.push(path);
                        batches_completed += 1;
                    }
                    Err(e) => {
                        error!("Batch {} complete but its checkpoint failed: {}", batch_number, e);
                        failed_checkpoints.push((batch_number, e.to_string()));
                    }
                }
                batches_run += 1;
            }
            outcomes.extend(batch_outcomes);

            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
        }

        let stats = state.snapshot();
        if cancelled {
            warn!("Crawl cancelled after {} of {} URLs", stats.processed, total);
        } else {
            info!("Crawl complete: {} of {} URLs successful", stats.successful, total);
        }

        Ok(CrawlReport {
            outcomes,
            stats,
            batches_completed,
            checkpoints,
            cancelled,
            failed_checkpoints,
        })
    }

    async fn run_batch(
        &self,
        batch: Vec<CrawlJob>,
        semaphore: &Arc<Semaphore>,
        state: &Arc<RunState>,
        cancel: &CancellationToken,
    ) -> Vec<CrawlOutcome> {
        let tasks = batch
            .iter()
            .cloned()
            .map(|job| {
                let semaphore = semaphore.clone();
                let state = state.clone();
                let cancel = cancel.clone();
                let fetcher = self.fetcher.clone();
                let config = self.config.clone();
                let limiter = self.limiter.clone();
                let delay = self.random_delay();
                let span = debug_span!("job", index = job.index);

                tokio::spawn(
                    async move {
                        let Ok(_permit) = semaphore.acquire_owned().await else {
                            return None;
                        };
                        if cancel.is_cancelled() {
                            return None;
                        }
                        tokio::time::sleep(delay).await;
                        if cancel.is_cancelled() {
                            return None;
                        }

                        info!("Processing [{}]: {}", job.index, job.url);
                        let result = fetch_with_retry(fetcher.as_ref(), &job.url, &config, limiter.as_deref()).await;
                        log_result(&result);
                        state.record(&job, &result);
                        Some(CrawlOutcome::new(job, result))
                    }
                    .instrument(span),
                )
            })
            .collect::<Vec<_>>();

        let results = future::join_all(tasks).await;

        let mut outcomes = Vec::with_capacity(batch.len());
        for (job, joined) in batch.into_iter().zip(results) {
            match joined {
                Ok(Some(outcome)) => outcomes.push(outcome),
                Ok(None) => debug!("Skipped [{}] after cancellation", job.index),
                Err(e) => {
                    error!("Worker for [{}] {} failed: {}", job.index, job.url, e);
                    let result = FetchResult::failure(
                        &job.url,
                        &job.url,
                        ErrorInfo::new(ErrorKind::UnknownError, format!("Worker failed: {}", e)),
                    );
                    state.record(&job, &result);
                    outcomes.push(CrawlOutcome::new(job, result));
                }
            }
        }
        outcomes
    }

    fn random_delay(&self) -> Duration {
        let (min, max) = (self.config.min_delay, self.config.max_delay);
        if min >= max {
            return min;
        }
        thread_rng().gen_range(min..=max)
    }
}

/// Fetch a URL, retrying transient failures with exponential backoff
async fn fetch_with_retry<F: PageFetcher>(
    fetcher: &F,
    url: &str,
    config: &CrawlerConfig,
    limiter: Option<&DefaultDirectRateLimiter>,
) -> FetchResult {
    let mut attempt = 0;
    loop {
        if let Some(limiter) = limiter {
            limiter.until_ready().instrument(debug_span!("limiter")).await;
        }

        let result = fetcher.fetch(url).await;
        if attempt >= config.max_retries || !should_retry(&result, config) {
            return result;
        }

        attempt += 1;
        let backoff = config.backoff(attempt);
        debug!(
            attempt,
            backoff_ms = backoff.as_millis() as u64,
            "Retrying {} after {}",
            url,
            result.error.as_ref().map_or_else(String::new, |e| e.to_string())
        );
        tokio::time::sleep(backoff).await;
    }
}

fn should_retry(result: &FetchResult, config: &CrawlerConfig) -> bool {
    match result.error_kind() {
        None => false,
        Some(kind) if kind.is_transient() => true,
        Some(_) => result
            .status_code
            .is_some_and(|code| config.retry_statuses.contains(&code)),
    }
}

fn log_result(result: &FetchResult) {
    if result.was_redirected() {
        info!("Redirected {} times to: {}", result.redirect_count, result.final_url);
    }
    match &result.error {
        None => info!("Success: {}", result.status_code.unwrap_or_default()),
        Some(error) => match error.kind {
            ErrorKind::HttpClientError | ErrorKind::HttpServerError | ErrorKind::ContentTypeError => {
                warn!("{}: {}", result.original_url, error)
            }
            _ => error!("{}: {}", result.original_url, error),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use tempfile::TempDir;

    /// Deterministic fetcher keyed on the URL path
    #[derive(Default)]
    struct MockFetcher {
        attempts: Mutex<HashMap<String, u32>>,
        cancel_on: Option<(String, CancellationToken)>,
        checkpoint_seen: Option<(String, PathBuf, Mutex<Option<bool>>)>,
    }

    impl MockFetcher {
        fn attempts(&self, url: &str) -> u32 {
            self.attempts.lock().unwrap().get(url).copied().unwrap_or(0)
        }

        fn respond(&self, url: &str) -> FetchResult {
            let attempt = {
                let mut attempts = self.attempts.lock().unwrap();
                let count = attempts.entry(url.to_string()).or_insert(0);
                *count += 1;
                *count
            };
            if let Some((trigger, token)) = &self.cancel_on {
                if url == trigger {
                    token.cancel();
                }
            }
            if let Some((trigger, path, seen)) = &self.checkpoint_seen {
                if url == trigger {
                    *seen.lock().unwrap() = Some(path.exists());
                }
            }

            let fail = |kind, status: Option<u16>, message: &str| {
                let mut result = FetchResult::failure(url, url, ErrorInfo::new(kind, message));
                result.status_code = status;
                result
            };
            let ok = |redirects: u32| {
                let mut result = fail(ErrorKind::UnknownError, Some(200), "");
                result.error = None;
                result.raw_html = Some("<html></html>".to_string());
                result.redirect_count = redirects;
                result
            };

            if url.contains("/panic") {
                panic!("mock fetcher exploded");
            } else if url.contains("/missing") {
                fail(ErrorKind::HttpClientError, Some(404), "HTTP 404")
            } else if url.contains("/unavailable") {
                fail(ErrorKind::HttpServerError, Some(503), "HTTP 503")
            } else if url.contains("/timeout") {
                fail(ErrorKind::Timeout, None, "Request timeout")
            } else if url.contains("/flaky") && attempt == 1 {
                fail(ErrorKind::ConnectionError, None, "Connection reset")
            } else if url.contains("/moved") {
                ok(1)
            } else {
                ok(0)
            }
        }
    }

    impl PageFetcher for MockFetcher {
        async fn fetch(&self, url: &str) -> FetchResult {
            self.respond(url)
        }
    }

    fn config(dir: &TempDir) -> CrawlerConfigBuilder {
        CrawlerConfig::builder()
            .no_delay()
            .backoff_base(Duration::ZERO)
            .checkpoint_dir(dir.path())
    }

    fn jobs(paths: &[&str]) -> Vec<CrawlJob> {
        paths
            .iter()
            .enumerate()
            .map(|(i, path)| CrawlJob::new(i, format!("https://example.com{}", path), format!("Job {}", i)))
            .collect()
    }

    #[tokio::test]
    async fn test_every_job_counted_once() {
        let dir = TempDir::new().unwrap();
        let paths: Vec<&str> = ["/ok", "/moved", "/missing", "/timeout", "/unavailable"]
            .iter()
            .cycle()
            .take(23)
            .copied()
            .collect();
        let crawler = BatchCrawler::new(
            MockFetcher::default(),
            config(&dir).batch_size(10).workers(3).max_retries(0).build(),
        )
        .unwrap();

        let report = crawler.run(jobs(&paths), CancellationToken::new()).await.unwrap();

        assert!(!report.cancelled);
        assert_eq!(report.outcomes.len(), 23);
        assert_eq!(report.stats.total, 23);
        assert_eq!(report.stats.processed, 23);
        assert_eq!(report.stats.successful + report.stats.failed(), 23);
        assert_eq!(report.stats.successful, 10);
        assert_eq!(report.stats.redirected, 5);
        assert_eq!(report.stats.error_count(ErrorKind::HttpClientError), 5);
        assert_eq!(report.stats.error_count(ErrorKind::Timeout), 4);
        assert_eq!(report.stats.error_count(ErrorKind::HttpServerError), 4);

        let indices: HashSet<usize> = report.outcomes.iter().map(|o| o.job.index).collect();
        assert_eq!(indices.len(), 23);

        assert_eq!(report.batches_completed, 3);
        for batch in 1..=3 {
            assert!(crawler.checkpoints().path_for(batch).exists());
        }
        assert_eq!(crawler.checkpoints().load(3).await.unwrap().len(), 3);
        assert_eq!(crawler.checkpoints().load_all().await.unwrap().len(), 23);
    }

    #[tokio::test]
    async fn test_checkpoint_written_before_next_batch() {
        let dir = TempDir::new().unwrap();
        let first_checkpoint = CheckpointStore::new(dir.path()).path_for(1);
        let fetcher = MockFetcher {
            checkpoint_seen: Some((
                "https://example.com/second".to_string(),
                first_checkpoint,
                Mutex::new(None),
            )),
            ..Default::default()
        };
        let crawler = BatchCrawler::new(fetcher, config(&dir).batch_size(2).workers(2).build()).unwrap();

        crawler
            .run(jobs(&["/ok", "/ok", "/second"]), CancellationToken::new())
            .await
            .unwrap();

        let (_, _, seen) = crawler.fetcher.checkpoint_seen.as_ref().unwrap();
        assert_eq!(*seen.lock().unwrap(), Some(true));
    }

    #[tokio::test]
    async fn test_checkpoint_failure_keeps_results() {
        let dir = TempDir::new().unwrap();
        let not_a_dir = dir.path().join("checkpoints");
        std::fs::write(&not_a_dir, "occupied").unwrap();
        let crawler = BatchCrawler::new(
            MockFetcher::default(),
            CrawlerConfig::builder()
                .no_delay()
                .batch_size(2)
                .checkpoint_dir(&not_a_dir)
                .build(),
        )
        .unwrap();

        let report = crawler
            .run(jobs(&["/ok", "/missing", "/ok"]), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.stats.processed, 3);
        assert_eq!(report.stats.successful, 2);
        assert_eq!(report.batches_completed, 0);
        assert!(report.checkpoints.is_empty());
        assert_eq!(
            report.failed_checkpoints.iter().map(|(batch, _)| *batch).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert_eq!(report.records().len(), 3);
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let dir = TempDir::new().unwrap();
        let fetcher = MockFetcher::default();
        let crawler = BatchCrawler::new(fetcher, config(&dir).max_retries(2).build()).unwrap();

        let report = crawler
            .run(jobs(&["/flaky", "/unavailable", "/missing"]), CancellationToken::new())
            .await
            .unwrap();

        assert!(report.outcomes[0].result.is_success());
        assert_eq!(crawler.fetcher.attempts("https://example.com/flaky"), 2);
        assert_eq!(
            report.outcomes[1].result.error_kind(),
            Some(ErrorKind::HttpServerError)
        );
        assert_eq!(crawler.fetcher.attempts("https://example.com/unavailable"), 3);
        assert_eq!(crawler.fetcher.attempts("https://example.com/missing"), 1);
    }

    #[tokio::test]
    async fn test_worker_panic_becomes_unknown_error() {
        let dir = TempDir::new().unwrap();
        let crawler = BatchCrawler::new(MockFetcher::default(), config(&dir).build()).unwrap();

        let report = crawler
            .run(jobs(&["/ok", "/panic", "/ok"]), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.outcomes[1].result.error_kind(), Some(ErrorKind::UnknownError));
        assert_eq!(report.stats.processed, 3);
        assert_eq!(report.stats.error_count(ErrorKind::UnknownError), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let dir = TempDir::new().unwrap();
        let crawler = BatchCrawler::new(MockFetcher::default(), config(&dir).build()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = crawler.run(jobs(&["/ok", "/ok"]), cancel).await.unwrap();

        assert!(report.cancelled);
        assert!(report.outcomes.is_empty());
        assert_eq!(report.stats.processed, 0);
        assert_eq!(report.batches_completed, 0);
        assert!(!crawler.checkpoints().path_for(1).exists());
    }

    #[tokio::test]
    async fn test_cancelled_mid_batch_keeps_partial_checkpoint() {
        let dir = TempDir::new().unwrap();
        let cancel = CancellationToken::new();
        let fetcher = MockFetcher {
            cancel_on: Some(("https://example.com/stop".to_string(), cancel.clone())),
            ..Default::default()
        };
        let crawler = BatchCrawler::new(fetcher, config(&dir).batch_size(2).workers(1).build()).unwrap();

        let report = crawler
            .run(jobs(&["/stop", "/stop", "/ok", "/ok"]), cancel)
            .await
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.stats.processed, 1);
        assert_eq!(report.batches_completed, 1);
        assert_eq!(crawler.checkpoints().load(1).await.unwrap().len(), 1);
        assert!(!crawler.checkpoints().path_for(2).exists());
    }

    #[tokio::test]
    async fn test_resume_skips_checkpointed_jobs() {
        let dir = TempDir::new().unwrap();
        let all = jobs(&["/ok", "/ok", "/ok", "/ok"]);

        let first = BatchCrawler::new(MockFetcher::default(), config(&dir).batch_size(2).build()).unwrap();
        first.run(all[..2].to_vec(), CancellationToken::new()).await.unwrap();

        let second = BatchCrawler::new(MockFetcher::default(), config(&dir).batch_size(2).build()).unwrap();
        let pending = second.pending_jobs(all).await.unwrap();
        assert_eq!(pending.iter().map(|j| j.index).collect::<Vec<_>>(), vec![2, 3]);

        let report = second.run(pending, CancellationToken::new()).await.unwrap();
        assert_eq!(report.checkpoints, vec![second.checkpoints().path_for(2)]);
        assert_eq!(second.checkpoints().load_all().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_progress_channel() {
        let dir = TempDir::new().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let crawler = BatchCrawler::new(MockFetcher::default(), config(&dir).workers(2).build())
            .unwrap()
            .with_progress(tx);

        crawler
            .run(jobs(&["/ok", "/missing", "/ok"]), CancellationToken::new())
            .await
            .unwrap();
        drop(crawler);

        let mut updates = Vec::new();
        while let Some(update) = rx.recv().await {
            updates.push(update);
        }
        assert_eq!(updates.len(), 3);
        assert!(updates.iter().all(|u| u.total == 3));
        assert_eq!(updates.iter().map(|u| u.completed).max(), Some(3));
        assert_eq!(updates.iter().filter(|u| u.error.is_some()).count(), 1);
    }

    #[test]
    fn test_record_truncates_title() {
        let crawled_at = Utc::now() - chrono::Duration::minutes(5);
        let outcome = CrawlOutcome {
            job: CrawlJob::new(1, "https://example.com", "t".repeat(80)),
            result: FetchResult::failure(
                "https://example.com",
                "https://example.com",
                ErrorInfo::new(ErrorKind::Timeout, "Request timeout"),
            ),
            crawled_at,
        };
        let record = CrawlRecord::from(&outcome);
        assert_eq!(record.crawled_at, crawled_at);
        assert_eq!(record.title.chars().count(), 53);
        assert!(record.title.ends_with("..."));
        assert_eq!(record.error_type, Some(ErrorKind::Timeout));
        assert_eq!(record.error_message.as_deref(), Some("Request timeout"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = BatchCrawler::new(MockFetcher::default(), CrawlerConfig::builder().workers(0).build());
        assert!(matches!(result, Err(CrawlError::InvalidConfig(_))));
    }
}
