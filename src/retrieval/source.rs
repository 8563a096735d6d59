//! Providers of freshly fetched articles.

use std::path::{Path, PathBuf};

use crate::error::{IngestError, IngestResult};
use crate::ingest::read_collection;
use crate::types::Article;

/// Yields articles fetched since the last refresh.
///
/// Fetching (HTTP, RSS, HTML extraction) happens behind this trait; the
/// coordinator only sees the resulting articles.
pub trait ContentSource: Send + Sync {
    fn fetch_new_content(&self) -> IngestResult<Vec<Article>>;

    /// Called once the fetched articles have been stored.
    fn acknowledge(&self) -> IngestResult<()> {
        Ok(())
    }
}

/// Reads a JSON array of articles from a file.
///
/// A missing file means nothing new. Articles without a `scraped_at` are
/// stamped with the read time. A draining source deletes the file once the
/// coordinator acknowledges the batch.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    drain: bool,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            drain: false,
        }
    }

    pub fn draining(mut self, drain: bool) -> Self {
        self.drain = drain;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ContentSource for JsonFileSource {
    fn fetch_new_content(&self) -> IngestResult<Vec<Article>> {
        if !self.path.exists() {
            tracing::debug!(target: "ingest", "no inbox at {}", self.path.display());
            return Ok(Vec::new());
        }

        let mut articles = read_collection(&self.path)?;
        let now = chrono::Utc::now().to_rfc3339();
        for article in articles.iter_mut().filter(|a| a.scraped_at.is_empty()) {
            article.scraped_at = now.clone();
        }

        tracing::info!(
            target: "ingest",
            "fetched {} articles from {}",
            articles.len(),
            self.path.display()
        );
        Ok(articles)
    }

    fn acknowledge(&self) -> IngestResult<()> {
        if self.drain && self.path.exists() {
            std::fs::remove_file(&self.path).map_err(|e| IngestError::FileWrite {
                path: self.path.clone(),
                source: e,
            })?;
        }
        Ok(())
    }
}
