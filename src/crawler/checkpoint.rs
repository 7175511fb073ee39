//! Batch checkpoint storage
//!
//! Each completed batch is written to `crawl_progress_batch_<n>.json` in the
//! checkpoint directory as a JSON array of [`CrawlRecord`]s. Files are
//! written to a temporary name and renamed into place so a crash never
//! leaves a truncated checkpoint behind.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use super::CrawlRecord;

const FILE_PREFIX: &str = "crawl_progress_batch_";
const FILE_SUFFIX: &str = ".json";

/// Error type for checkpoint operations
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

type Result<T> = std::result::Result<T, CheckpointError>;

/// Reads and writes batch checkpoint files
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// Create a store rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the checkpoint files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the checkpoint for batch `batch` (1-based)
    pub fn path_for(&self, batch: usize) -> PathBuf {
        self.dir.join(format!("{}{}{}", FILE_PREFIX, batch, FILE_SUFFIX))
    }

    /// Batch number encoded in a checkpoint file name
    fn batch_number(path: &Path) -> Option<usize> {
        path.file_name()?
            .to_str()?
            .strip_prefix(FILE_PREFIX)?
            .strip_suffix(FILE_SUFFIX)?
            .parse()
            .ok()
    }

    /// Write the records of a completed batch
    pub async fn save(&self, batch: usize, records: &[CrawlRecord]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(batch);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(records)?;

        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &path).await?;

        debug!(path = %path.display(), records = records.len(), "Checkpoint saved");
        Ok(path)
    }

    /// Read the records of one batch
    pub async fn load(&self, batch: usize) -> Result<Vec<CrawlRecord>> {
        let path = self.path_for(batch);
        if !fs::try_exists(&path).await? {
            return Err(CheckpointError::NotFound(path.display().to_string()));
        }
        let json = fs::read(&path).await?;
        Ok(serde_json::from_slice(&json)?)
    }

    /// Batch numbers with a checkpoint on disk, ascending
    pub async fn batches(&self) -> Result<Vec<usize>> {
        if !fs::try_exists(&self.dir).await? {
            return Ok(Vec::new());
        }

        let mut batches = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Some(batch) = Self::batch_number(&entry.path()) {
                batches.push(batch);
            }
        }
        batches.sort_unstable();
        Ok(batches)
    }

    /// Read every checkpoint in the directory
    ///
    /// Files that fail to parse are skipped with a warning.
    pub async fn load_all(&self) -> Result<Vec<CrawlRecord>> {
        let mut records = Vec::new();
        for batch in self.batches().await? {
            match self.load(batch).await {
                Ok(batch_records) => records.extend(batch_records),
                Err(e) => warn!("Skipping unreadable checkpoint {}: {}", batch, e),
            }
        }
        Ok(records)
    }

    /// Job indices already recorded in any checkpoint
    pub async fn completed_indices(&self) -> Result<HashSet<usize>> {
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .map(|record| record.index)
            .collect())
    }

    /// Next unused batch number
    pub async fn next_batch_number(&self) -> Result<usize> {
        Ok(self.batches().await?.last().map_or(1, |last| last + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn record(index: usize) -> CrawlRecord {
        CrawlRecord {
            index,
            original_url: format!("https://example.com/{}", index),
            final_url: format!("https://example.com/{}", index),
            status_code: Some(200),
            redirect_count: 0,
            response_time: Some(0.12),
            error_type: None,
            error_message: None,
            title: "Example".to_string(),
            crawled_at: Utc::now(),
        }
    }

    #[test]
    fn test_path_for() {
        let store = CheckpointStore::new("logs");
        assert_eq!(store.path_for(3), Path::new("logs/crawl_progress_batch_3.json"));
        assert_eq!(CheckpointStore::batch_number(&store.path_for(12)), Some(12));
        assert_eq!(CheckpointStore::batch_number(Path::new("logs/crawler.log")), None);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path().join("nested"));

        let path = store.save(1, &[record(0), record(1)]).await.unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = store.load(1).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].index, 1);
    }

    #[tokio::test]
    async fn test_load_missing() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        assert!(matches!(store.load(7).await, Err(CheckpointError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_load_all_and_resume_helpers() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());

        assert_eq!(store.next_batch_number().await.unwrap(), 1);
        assert!(store.load_all().await.unwrap().is_empty());

        store.save(2, &[record(5)]).await.unwrap();
        store.save(1, &[record(3), record(4)]).await.unwrap();
        std::fs::write(dir.path().join("crawl_progress_batch_9.json"), "not json").unwrap();

        assert_eq!(store.batches().await.unwrap(), vec![1, 2, 9]);
        let records = store.load_all().await.unwrap();
        assert_eq!(records.iter().map(|r| r.index).collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(
            store.completed_indices().await.unwrap(),
            HashSet::from([3, 4, 5])
        );
        assert_eq!(store.next_batch_number().await.unwrap(), 10);
    }
}
