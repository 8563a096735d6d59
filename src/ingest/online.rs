//! Loader for `<source>_articles.json` collections.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::chunking::Chunker;
use crate::error::IngestError;
use crate::ingest::{LoadedSource, url_digest};
use crate::types::{Article, DocumentChunk, SourceType};

/// File name suffix of an article collection.
pub const COLLECTION_SUFFIX: &str = "_articles.json";

/// Source name encoded in a collection file name (`rss_articles.json` → `rss`).
pub fn source_name_of(path: &Path) -> Option<String> {
    path.file_name()?
        .to_str()?
        .strip_suffix(COLLECTION_SUFFIX)
        .map(str::to_string)
}

pub struct OnlineArticleLoader<'a> {
    dir: &'a Path,
    chunker: &'a Chunker,
}

impl<'a> OnlineArticleLoader<'a> {
    pub fn new(dir: &'a Path, chunker: &'a Chunker) -> Self {
        Self { dir, chunker }
    }

    /// Collection files in path order. A missing directory yields none.
    pub fn collection_paths(&self) -> Result<Vec<PathBuf>, IngestError> {
        if !self.dir.is_dir() {
            tracing::info!(
                target: "ingest",
                "online content directory {} not found",
                self.dir.display()
            );
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(self.dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| IngestError::DirectoryRead {
                path: self.dir.to_path_buf(),
                source: e.into(),
            })?;
            if entry.file_type().is_file() && source_name_of(entry.path()).is_some() {
                paths.push(entry.into_path());
            }
        }
        Ok(paths)
    }

    pub fn load(&self) -> LoadedSource {
        let paths = match self.collection_paths() {
            Ok(paths) => paths,
            Err(e) => {
                tracing::warn!(target: "ingest", "{e}");
                return LoadedSource::default();
            }
        };

        let mut loaded = LoadedSource::default();
        for path in paths {
            let Some(source_name) = source_name_of(&path) else {
                continue;
            };
            let articles = match read_collection(&path) {
                Ok(articles) => articles,
                Err(e) => {
                    tracing::warn!(target: "ingest", "skipping collection: {e}");
                    continue;
                }
            };

            let mut seen = HashSet::new();
            for article in articles.iter().filter(|a| !a.is_empty()) {
                if !seen.insert(article_digest(article)) {
                    tracing::warn!(
                        target: "ingest",
                        "skipping repeated article {} in {}",
                        article.url,
                        path.display()
                    );
                    continue;
                }
                loaded.documents += 1;
                loaded.sources.insert(source_name.clone());
                loaded.chunks.extend(self.chunk_article(article, &source_name));
            }
        }

        tracing::debug!(
            target: "ingest",
            "loaded {} online articles ({} chunks)",
            loaded.documents,
            loaded.chunks.len()
        );
        loaded
    }

    /// Chunks one article, stamping online provenance on every chunk.
    pub fn chunk_article(&self, article: &Article, source_name: &str) -> Vec<DocumentChunk> {
        let digest = article_digest(article);

        self.chunker
            .chunk(&article.content, SourceType::Online)
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let mut chunk = DocumentChunk::new(
                    format!("online_{source_name}_{digest}_{i}"),
                    article.title.clone(),
                    text,
                    article.url.clone(),
                    SourceType::Online,
                    i,
                );
                chunk.source_name = Some(source_name.to_string());
                chunk.published_at = non_empty(&article.published);
                chunk.scraped_at = non_empty(&article.scraped_at);
                chunk.relevance_score = Some(article.relevance_score);
                chunk
            })
            .collect()
    }
}

/// Parses one collection file.
pub fn read_collection(path: &Path) -> Result<Vec<Article>, IngestError> {
    let json = std::fs::read_to_string(path).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&json).map_err(|e| IngestError::MalformedCollection {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Identity of an article within a collection: its URL, or its content when
/// it has none.
fn article_digest(article: &Article) -> String {
    if article.url.is_empty() {
        url_digest(&article.content)
    } else {
        url_digest(&article.url)
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
