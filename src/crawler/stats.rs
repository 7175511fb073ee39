//! Run-level crawl statistics

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ErrorKind;
use crate::fetcher::FetchResult;

/// Counters for one crawl run
///
/// Every processed job lands in exactly one of `successful` or `errors`, so
/// `successful + total errors == processed` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlStats {
    /// Jobs submitted to the run
    pub total: usize,

    /// Jobs finished so far
    pub processed: usize,

    /// Jobs that produced HTML
    pub successful: usize,

    /// Jobs that followed at least one redirect, whatever their outcome
    pub redirected: usize,

    /// Failed jobs per error kind
    pub errors: BTreeMap<ErrorKind, usize>,
}

impl CrawlStats {
    /// Start a run of `total` jobs
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Count one finished job
    pub fn record(&mut self, result: &FetchResult) {
        self.processed += 1;
        if result.was_redirected() {
            self.redirected += 1;
        }
        match result.error_kind() {
            None => self.successful += 1,
            Some(kind) => *self.errors.entry(kind).or_default() += 1,
        }
    }

    /// Failures of one kind
    pub fn error_count(&self, kind: ErrorKind) -> usize {
        self.errors.get(&kind).copied().unwrap_or(0)
    }

    /// Failures of every kind
    pub fn failed(&self) -> usize {
        self.errors.values().sum()
    }

    /// Share of processed jobs that succeeded, in percent
    pub fn success_rate(&self) -> Option<f64> {
        if self.processed == 0 {
            None
        } else {
            Some(self.successful as f64 / self.processed as f64 * 100.0)
        }
    }
}

impl fmt::Display for CrawlStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total URLs: {}", self.total)?;
        writeln!(f, "Processed: {}", self.processed)?;
        writeln!(f, "Successful: {}", self.successful)?;
        writeln!(f, "Redirected: {}", self.redirected)?;
        for (kind, count) in &self.errors {
            writeln!(f, "{}: {}", kind, count)?;
        }
        if let Some(rate) = self.success_rate() {
            writeln!(f, "Success rate: {:.1}%", rate)?;
        }
        Ok(())
    }
}
