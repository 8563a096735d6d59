//! On-disk form of a linear index.
//!
//! Two files live side by side in the index directory:
//! - `data.json`: format version, model name, dimension, chunk texts and
//!   chunk metadata, position-aligned
//! - `embeddings.vec`: the embedding matrix (see [`crate::vector::write_matrix`])
//!
//! A load only succeeds when both files agree with each other and with the
//! embedding provider in use. Anything less is reported as an error and the
//! caller starts from an empty index.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{IndexError, IndexResult};
use crate::index::IndexEntry;
use crate::types::ChunkMetadata;
use crate::vector::{EmbeddingMatrix, read_matrix, write_matrix};

pub const RECORD_FILE: &str = "data.json";
pub const MATRIX_FILE: &str = "embeddings.vec";

const CURRENT_VERSION: u32 = 1;

#[derive(Serialize)]
struct RecordOut<'a> {
    version: u32,
    model_name: &'a str,
    dimension: usize,
    updated_at: String,
    documents: Vec<&'a str>,
    metadata: Vec<&'a ChunkMetadata>,
}

#[derive(Deserialize)]
struct RecordIn {
    version: u32,
    model_name: String,
    dimension: usize,
    documents: Vec<String>,
    metadata: Vec<ChunkMetadata>,
}

/// Saves and loads index contents under one directory.
#[derive(Debug, Clone)]
pub struct IndexPersistence {
    base_path: PathBuf,
}

impl IndexPersistence {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn record_path(&self) -> PathBuf {
        self.base_path.join(RECORD_FILE)
    }

    pub fn matrix_path(&self) -> PathBuf {
        self.base_path.join(MATRIX_FILE)
    }

    /// True if either artifact is present.
    pub fn exists(&self) -> bool {
        self.record_path().exists() || self.matrix_path().exists()
    }

    /// Writes both artifacts, each through a temp file and rename.
    pub fn save(
        &self,
        model_name: &str,
        entries: &[IndexEntry],
        matrix: &EmbeddingMatrix,
    ) -> IndexResult<()> {
        std::fs::create_dir_all(&self.base_path).map_err(|e| self.persist_error(e))?;

        write_matrix(&self.matrix_path(), matrix).map_err(|e| IndexError::PersistenceError {
            path: self.matrix_path(),
            source: Box::new(e),
        })?;

        let record = RecordOut {
            version: CURRENT_VERSION,
            model_name,
            dimension: matrix.dimension().get(),
            updated_at: chrono::Utc::now().to_rfc3339(),
            documents: entries.iter().map(|e| e.content.as_str()).collect(),
            metadata: entries.iter().map(|e| &e.metadata).collect(),
        };

        let temp = NamedTempFile::new_in(&self.base_path).map_err(|e| self.persist_error(e))?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, &record).map_err(|e| self.persist_error(e))?;
            writer.flush().map_err(|e| self.persist_error(e))?;
        }
        temp.persist(self.record_path())
            .map_err(|e| self.persist_error(e.error))?;

        tracing::debug!(
            target: "index",
            "saved {} entries to {}",
            entries.len(),
            self.base_path.display()
        );
        Ok(())
    }

    /// Loads both artifacts.
    ///
    /// Returns `Ok(None)` when neither file exists. Every other inconsistency
    /// (one file missing, parse failures, mismatched row counts, a different
    /// model or dimension) is an error.
    pub fn load(
        &self,
        expected_model: &str,
        expected_dimension: usize,
    ) -> IndexResult<Option<(Vec<IndexEntry>, EmbeddingMatrix)>> {
        let record_path = self.record_path();
        let matrix_path = self.matrix_path();

        match (record_path.exists(), matrix_path.exists()) {
            (false, false) => return Ok(None),
            (true, false) => {
                return Err(IndexError::IndexCorrupted {
                    reason: format!("{MATRIX_FILE} is missing"),
                });
            }
            (false, true) => {
                return Err(IndexError::IndexCorrupted {
                    reason: format!("{RECORD_FILE} is missing"),
                });
            }
            (true, true) => {}
        }

        let json = std::fs::read_to_string(&record_path).map_err(|e| IndexError::LoadError {
            path: record_path.clone(),
            source: Box::new(e),
        })?;
        let record: RecordIn = serde_json::from_str(&json).map_err(|e| IndexError::LoadError {
            path: record_path.clone(),
            source: Box::new(e),
        })?;

        if record.version > CURRENT_VERSION {
            return Err(IndexError::IndexCorrupted {
                reason: format!(
                    "record version {} is newer than supported version {CURRENT_VERSION}",
                    record.version
                ),
            });
        }

        if record.model_name != expected_model {
            return Err(IndexError::ModelMismatch {
                expected: expected_model.to_string(),
                found: record.model_name,
            });
        }

        let matrix = read_matrix(&matrix_path).map_err(|e| IndexError::LoadError {
            path: matrix_path.clone(),
            source: Box::new(e),
        })?;

        if record.dimension != expected_dimension || matrix.dimension().get() != expected_dimension
        {
            return Err(IndexError::IndexCorrupted {
                reason: format!(
                    "dimension {} (record) / {} (matrix) does not match provider dimension {expected_dimension}",
                    record.dimension,
                    matrix.dimension()
                ),
            });
        }

        let rows = matrix.row_count();
        if record.documents.len() != rows || record.metadata.len() != rows {
            return Err(IndexError::IndexCorrupted {
                reason: format!(
                    "{} documents, {} metadata records and {rows} embedding rows",
                    record.documents.len(),
                    record.metadata.len()
                ),
            });
        }

        let entries = record
            .documents
            .into_iter()
            .zip(record.metadata)
            .map(|(content, metadata)| IndexEntry { content, metadata })
            .collect();

        Ok(Some((entries, matrix)))
    }

    fn persist_error(&self, e: impl std::error::Error + Send + Sync + 'static) -> IndexError {
        IndexError::PersistenceError {
            path: self.base_path.clone(),
            source: Box::new(e),
        }
    }
}
