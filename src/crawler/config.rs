//! # Crawler Configuration Module
//!
//! This module provides configuration options for the batch crawler:
//! batching, worker count, politeness delay, retries and checkpointing.
//! It uses a builder pattern for flexible configuration.
//!
//! ## Key Components
//!
//! - `CrawlerConfig`: The main configuration struct with crawler parameters
//! - `CrawlerConfigBuilder`: Builder pattern implementation for easier configuration
//!
//! ## Defaults
//!
//! - Batches of 100 jobs, 5 concurrent workers
//! - A random 1-3 second pause before every request
//! - Up to 3 retries with exponential backoff from 1 second, for timeouts,
//!   connection errors and statuses 429, 500, 502, 503 and 504
//! - Checkpoints written to `logs/`

use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

use super::error::CrawlError;

/// Statuses that are retried by default
pub const DEFAULT_RETRY_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

/// Configuration for the batch crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Jobs per checkpointed batch
    pub batch_size: usize,

    /// Maximum number of requests in flight
    pub workers: usize,

    /// Lower bound of the pause before each request
    pub min_delay: Duration,

    /// Upper bound of the pause before each request
    pub max_delay: Duration,

    /// Retries after the first attempt
    pub max_retries: u32,

    /// Backoff before the first retry; doubled for each further retry
    pub backoff_base: Duration,

    /// Response statuses worth retrying
    pub retry_statuses: Vec<u16>,

    /// Optional global cap on requests per second
    pub max_requests_per_second: Option<NonZeroU32>,

    /// Directory receiving the batch checkpoint files
    pub checkpoint_dir: PathBuf,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            workers: 5,
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(3),
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            retry_statuses: DEFAULT_RETRY_STATUSES.to_vec(),
            max_requests_per_second: None,
            checkpoint_dir: PathBuf::from("logs"),
        }
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Set the number of jobs per batch
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Set the number of concurrent workers
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Set the range of the random pause before each request
    pub fn delay_range(mut self, min_delay: Duration, max_delay: Duration) -> Self {
        self.config.min_delay = min_delay;
        self.config.max_delay = max_delay;
        self
    }

    /// Disable the pause before each request
    pub fn no_delay(self) -> Self {
        self.delay_range(Duration::ZERO, Duration::ZERO)
    }

    /// Set the number of retries
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Set the initial backoff between retries
    pub fn backoff_base(mut self, backoff_base: Duration) -> Self {
        self.config.backoff_base = backoff_base;
        self
    }

    /// Set the statuses that are retried
    pub fn retry_statuses(mut self, retry_statuses: Vec<u16>) -> Self {
        self.config.retry_statuses = retry_statuses;
        self
    }

    /// Cap the request rate across all workers
    pub fn max_requests_per_second(mut self, rps: Option<NonZeroU32>) -> Self {
        self.config.max_requests_per_second = rps;
        self
    }

    /// Set the checkpoint directory
    pub fn checkpoint_dir(mut self, checkpoint_dir: impl Into<PathBuf>) -> Self {
        self.config.checkpoint_dir = checkpoint_dir.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }

    /// Check the configuration for values the crawler cannot run with
    pub fn validate(&self) -> Result<(), CrawlError> {
        if self.batch_size == 0 {
            return Err(CrawlError::InvalidConfig("batch size must be at least 1".to_string()));
        }
        if self.workers == 0 {
            return Err(CrawlError::InvalidConfig("worker count must be at least 1".to_string()));
        }
        if self.min_delay > self.max_delay {
            return Err(CrawlError::InvalidConfig(format!(
                "minimum delay {:?} exceeds maximum delay {:?}",
                self.min_delay, self.max_delay
            )));
        }
        Ok(())
    }

    /// Backoff before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff_base.saturating_mul(factor)
    }
}
