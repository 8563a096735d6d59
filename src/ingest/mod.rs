//! Content ingestion.
//!
//! Static documents and online article collections are read, chunked and
//! stamped with provenance so the index sees one uniform stream of
//! [`DocumentChunk`](crate::types::DocumentChunk)s.

mod article_store;
mod normalizer;
mod online;
mod static_docs;

use std::collections::BTreeSet;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::types::DocumentChunk;

pub use article_store::{ArticleStore, METADATA_FILE, UpdateMetadata, sanitize_source_id};
pub use normalizer::{ContentNormalizer, DocumentStats};
pub use online::{COLLECTION_SUFFIX, OnlineArticleLoader, read_collection, source_name_of};
pub use static_docs::{StaticDocumentLoader, document_title};

/// Output of one loader pass.
#[derive(Debug, Default)]
pub struct LoadedSource {
    pub chunks: Vec<DocumentChunk>,
    /// Documents (files or non-empty articles) that were read
    pub documents: usize,
    /// Distinct files or source names contributing documents
    pub sources: BTreeSet<String>,
}

/// SHA256 hex digest of `content`.
pub fn calculate_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// First 16 hex characters of the SHA256 of `url`.
pub fn url_digest(url: &str) -> String {
    let mut digest = calculate_hash(url);
    digest.truncate(16);
    digest
}

/// RFC 3339 UTC rendering of a file timestamp.
pub fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339()
}
