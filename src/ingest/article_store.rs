//! Writes fetched articles into the online content directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IngestError, IngestResult};
use crate::ingest::online::{COLLECTION_SUFFIX, read_collection};
use crate::types::Article;

/// Name of the update summary written after every save.
pub const METADATA_FILE: &str = "metadata.json";

/// Summary of the most recent save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateMetadata {
    pub total_articles: usize,
    pub sources: Vec<String>,
    pub scraped_at: String,
    pub articles_by_source: BTreeMap<String, usize>,
}

/// Maps an arbitrary source id onto a file-name-safe one.
pub fn sanitize_source_id(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

/// Article collections on disk, one file per source id.
#[derive(Debug, Clone)]
pub struct ArticleStore {
    dir: PathBuf,
}

impl ArticleStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn collection_path(&self, source_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}{COLLECTION_SUFFIX}", sanitize_source_id(source_id)))
    }

    /// Articles currently stored for `source_id`.
    pub fn load_source(&self, source_id: &str) -> IngestResult<Vec<Article>> {
        let path = self.collection_path(source_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        read_collection(&path)
    }

    /// Merges `articles` into their source collections and writes the
    /// update summary. Returns the number of articles saved.
    ///
    /// Articles sharing a URL with a stored one replace it in place. A source
    /// whose stored collection cannot be parsed is logged and left untouched;
    /// the other sources and the summary are still written.
    pub fn save_articles(&self, articles: &[Article]) -> IngestResult<usize> {
        std::fs::create_dir_all(&self.dir).map_err(|e| IngestError::FileWrite {
            path: self.dir.clone(),
            source: e,
        })?;

        let mut by_source: BTreeMap<String, Vec<&Article>> = BTreeMap::new();
        for article in articles {
            let key = if article.source_id.trim().is_empty() {
                &article.source
            } else {
                &article.source_id
            };
            by_source
                .entry(sanitize_source_id(key))
                .or_default()
                .push(article);
        }

        let mut articles_by_source = BTreeMap::new();
        for (source_id, incoming) in &by_source {
            let mut merged = match self.load_source(source_id) {
                Ok(stored) => stored,
                Err(e @ IngestError::MalformedCollection { .. }) => {
                    tracing::warn!(
                        target: "ingest",
                        "skipping {} articles for {source_id}: {e}",
                        incoming.len()
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };
            for article in incoming {
                let existing = (!article.url.is_empty())
                    .then(|| merged.iter().position(|a| a.url == article.url))
                    .flatten();
                match existing {
                    Some(position) => merged[position] = (*article).clone(),
                    None => merged.push((*article).clone()),
                }
            }

            self.write_json(&self.collection_path(source_id), &merged)?;
            articles_by_source.insert(source_id.clone(), incoming.len());
            tracing::debug!(
                target: "ingest",
                "saved {} articles for {source_id} ({} stored)",
                incoming.len(),
                merged.len()
            );
        }

        let saved = articles_by_source.values().sum();
        let metadata = UpdateMetadata {
            total_articles: saved,
            sources: articles_by_source.keys().cloned().collect(),
            scraped_at: chrono::Utc::now().to_rfc3339(),
            articles_by_source,
        };
        self.write_json(&self.dir.join(METADATA_FILE), &metadata)?;

        Ok(saved)
    }

    /// The summary written by the last save, if any.
    pub fn last_update(&self) -> IngestResult<Option<UpdateMetadata>> {
        let path = self.dir.join(METADATA_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path).map_err(|e| IngestError::FileRead {
            path: path.clone(),
            source: e,
        })?;
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| IngestError::MalformedCollection { path, source: e })
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> IngestResult<()> {
        let json = serde_json::to_string_pretty(value).map_err(|e| IngestError::Serialization {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, json).map_err(|e| IngestError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
