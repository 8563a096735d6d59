//! Error types for the knowledge base
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use std::path::PathBuf;
use thiserror::Error;

use crate::vector::VectorError;

/// Errors raised while reading or writing source documents
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to list directory '{path}': {source}")]
    DirectoryRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed article collection '{path}': {source}")]
    MalformedCollection {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize '{path}': {source}")]
    Serialization {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl IngestError {
    /// Get the status code for this error
    pub fn status_code(&self) -> String {
        match self {
            Self::DirectoryRead { .. } => "DIRECTORY_READ_ERROR",
            Self::FileRead { .. } => "FILE_READ_ERROR",
            Self::FileWrite { .. } => "FILE_WRITE_ERROR",
            Self::MalformedCollection { .. } => "MALFORMED_COLLECTION",
            Self::Serialization { .. } => "SERIALIZATION_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::DirectoryRead { .. } | Self::FileRead { .. } => vec![
                "Check that the path exists and is readable",
                "Verify paths.knowledge_base and paths.online_content in settings.toml",
            ],
            Self::FileWrite { .. } => vec![
                "Check disk space and write permissions",
                "Ensure the parent directory exists",
            ],
            Self::MalformedCollection { .. } => vec![
                "The file must contain a JSON array of article objects",
                "Fix or remove the file; other collections still load",
            ],
            Self::Serialization { .. } => vec!["Check that article text is valid UTF-8"],
        }
    }
}

/// Errors raised by the vector index
#[derive(Error, Debug)]
pub enum IndexError {
    #[error(transparent)]
    Embedding(#[from] VectorError),

    #[error("Failed to persist index to '{path}': {source}")]
    PersistenceError {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to load index from '{path}': {source}")]
    LoadError {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Index corrupted: {reason}. Run 'knowbase index --force' to rebuild.")]
    IndexCorrupted { reason: String },

    #[error(
        "Index was built with embedding model '{found}' but '{expected}' is configured"
    )]
    ModelMismatch { expected: String, found: String },
}

impl IndexError {
    /// Get the status code for this error
    pub fn status_code(&self) -> String {
        match self {
            Self::Embedding(_) => "EMBEDDING_ERROR",
            Self::PersistenceError { .. } => "PERSISTENCE_ERROR",
            Self::LoadError { .. } => "LOAD_ERROR",
            Self::IndexCorrupted { .. } => "INDEX_CORRUPTED",
            Self::ModelMismatch { .. } => "MODEL_MISMATCH",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Embedding(_) => vec![
                "Verify the embedding model downloaded correctly",
                "Try embedding.provider = \"hashing\" to work offline",
            ],
            Self::PersistenceError { .. } => vec![
                "Check disk space and write permissions for index.path",
                "The in-memory index is still usable for this session",
            ],
            Self::LoadError { .. } | Self::IndexCorrupted { .. } => vec![
                "Run 'knowbase index --force' to rebuild from sources",
                "Delete the index directory to start fresh",
            ],
            Self::ModelMismatch { .. } => vec![
                "Rebuild with 'knowbase index --force' after changing models",
                "Or restore the embedding.model setting used to build the index",
            ],
        }
    }
}

/// Errors raised by the retrieval coordinator
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("Answer synthesis failed: {0}")]
    Synthesis(String),

    #[error("An index update is already in progress")]
    UpdateInProgress,
}

impl RetrievalError {
    /// Get the status code for this error
    pub fn status_code(&self) -> String {
        match self {
            Self::Ingest(e) => e.status_code(),
            Self::Index(e) => e.status_code(),
            Self::Synthesis(_) => "SYNTHESIS_ERROR".to_string(),
            Self::UpdateInProgress => "UPDATE_IN_PROGRESS".to_string(),
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Ingest(e) => e.recovery_suggestions(),
            Self::Index(e) => e.recovery_suggestions(),
            Self::Synthesis(_) => vec!["The extractive answer is used instead"],
            Self::UpdateInProgress => vec!["Wait for the running update to finish"],
        }
    }
}

/// Result type alias for ingestion operations
pub type IngestResult<T> = Result<T, IngestError>;

/// Result type alias for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Result type alias for coordinator operations
pub type RetrievalResult<T> = Result<T, RetrievalError>;
