//! Core data types shared by ingestion, indexing and retrieval.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Origin of a document chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Hand-written knowledge-base document on disk
    Static,
    /// Article pulled from an online content source
    Online,
}

impl SourceType {
    /// Id namespace prefix for chunks of this origin.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Online => "online",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The atomic retrievable unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Unique within one index generation
    pub id: String,
    pub title: String,
    pub content: String,
    /// File path or URL
    pub source: String,
    pub source_type: SourceType,
    /// 0-based ordinal within the parent document
    pub chunk_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f32>,
}

impl DocumentChunk {
    /// Builds a chunk with no optional provenance set.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        source: impl Into<String>,
        source_type: SourceType,
        chunk_index: usize,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            source: source.into(),
            source_type,
            chunk_index,
            last_updated: None,
            source_name: None,
            published_at: None,
            scraped_at: None,
            relevance_score: None,
        }
    }

    /// Splits the chunk into its content and the metadata kept beside the matrix.
    pub fn into_parts(self) -> (String, ChunkMetadata) {
        let metadata = ChunkMetadata {
            id: self.id,
            title: self.title,
            source: self.source,
            source_type: self.source_type,
            chunk_index: self.chunk_index,
            last_updated: self.last_updated,
            source_name: self.source_name,
            published_at: self.published_at,
            scraped_at: self.scraped_at,
            relevance_score: self.relevance_score,
        };
        (self.content, metadata)
    }

    /// Reassembles a chunk from persisted content and metadata.
    pub fn from_parts(content: String, metadata: ChunkMetadata) -> Self {
        Self {
            id: metadata.id,
            title: metadata.title,
            content,
            source: metadata.source,
            source_type: metadata.source_type,
            chunk_index: metadata.chunk_index,
            last_updated: metadata.last_updated,
            source_name: metadata.source_name,
            published_at: metadata.published_at,
            scraped_at: metadata.scraped_at,
            relevance_score: metadata.relevance_score,
        }
    }
}

/// Everything about a chunk except its text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub id: String,
    pub title: String,
    pub source: String,
    pub source_type: SourceType,
    pub chunk_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f32>,
}

/// One element of an online article collection.
///
/// On disk the fields are snake_case; camelCase spellings are accepted when
/// reading so collections written by other tools still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub published: String,
    #[serde(default, alias = "scrapedAt")]
    pub scraped_at: String,
    #[serde(default, alias = "relevanceScore")]
    pub relevance_score: f32,
    /// Human-readable source label
    #[serde(default)]
    pub source: String,
    /// Stable key used for the collection file name
    #[serde(default, alias = "sourceId")]
    pub source_id: String,
}

impl Article {
    /// True when the article carries no indexable text.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}
