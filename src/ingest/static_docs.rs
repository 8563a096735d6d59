//! Loader for hand-written documents in the knowledge-base directory.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use walkdir::WalkDir;

use crate::chunking::Chunker;
use crate::error::IngestError;
use crate::ingest::{LoadedSource, format_timestamp};
use crate::types::{DocumentChunk, SourceType};

static TITLE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^# (.+)$").expect("title pattern is valid"));

/// Title of a document: its first `# ` heading, else the file stem.
pub fn document_title(content: &str, stem: &str) -> String {
    TITLE_LINE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| stem.to_string())
}

/// Reads every file with a matching extension directly inside `dir`.
pub struct StaticDocumentLoader<'a> {
    dir: &'a Path,
    extensions: &'a [String],
    chunker: &'a Chunker,
}

impl<'a> StaticDocumentLoader<'a> {
    pub fn new(dir: &'a Path, extensions: &'a [String], chunker: &'a Chunker) -> Self {
        Self {
            dir,
            extensions,
            chunker,
        }
    }

    /// Document files in path order. A missing directory yields none.
    pub fn document_paths(&self) -> Result<Vec<PathBuf>, IngestError> {
        if !self.dir.is_dir() {
            tracing::info!(
                target: "ingest",
                "knowledge base directory {} not found",
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
            if entry.file_type().is_file() && self.has_wanted_extension(entry.path()) {
                paths.push(entry.into_path());
            }
        }
        Ok(paths)
    }

    fn has_wanted_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|wanted| wanted.eq_ignore_ascii_case(ext))
            })
    }

    pub fn load(&self) -> LoadedSource {
        let paths = match self.document_paths() {
            Ok(paths) => paths,
            Err(e) => {
                tracing::warn!(target: "ingest", "{e}");
                return LoadedSource::default();
            }
        };

        let mut loaded = LoadedSource::default();
        for path in paths {
            match self.load_file(&path) {
                Ok(chunks) => {
                    loaded.documents += 1;
                    loaded.sources.insert(path.display().to_string());
                    loaded.chunks.extend(chunks);
                }
                Err(e) => tracing::warn!(target: "ingest", "skipping document: {e}"),
            }
        }

        tracing::debug!(
            target: "ingest",
            "loaded {} static documents ({} chunks)",
            loaded.documents,
            loaded.chunks.len()
        );
        loaded
    }

    /// Chunks one document.
    pub fn load_file(&self, path: &Path) -> Result<Vec<DocumentChunk>, IngestError> {
        let content = std::fs::read_to_string(path).map_err(|e| IngestError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        // Ids carry the extension so `drs.md` and `drs.txt` stay distinct
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let title = document_title(&content, &stem);
        let last_updated = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(format_timestamp);
        let source = path.display().to_string();

        let chunks = self
            .chunker
            .chunk(&content, SourceType::Static)
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let mut chunk = DocumentChunk::new(
                    format!("static_{file_name}_{i}"),
                    title.clone(),
                    text,
                    source.clone(),
                    SourceType::Static,
                    i,
                );
                chunk.last_updated = last_updated.clone();
                chunk
            })
            .collect();

        Ok(chunks)
    }
}
