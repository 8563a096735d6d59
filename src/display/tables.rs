//! Table formatting utilities for structured output.

use comfy_table::{
    Attribute, Cell, CellAlignment, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
};

use crate::chunking::truncate_chars;
use crate::index::SearchHit;
use crate::retrieval::KnowledgeBaseStats;

/// Characters of chunk text shown per search hit.
const PREVIEW_CHARS: usize = 80;

/// Builder for creating formatted tables.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    /// Create a new table builder.
    pub fn new() -> Self {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.apply_modifier(UTF8_ROUND_CORNERS);
        Self { table }
    }

    /// Set the table headers.
    pub fn set_headers(mut self, headers: Vec<&str>) -> Self {
        let header_cells: Vec<Cell> = headers
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect();
        self.table.set_header(header_cells);
        self
    }

    /// Add a row to the table.
    pub fn add_row(mut self, row: Vec<String>) -> Self {
        self.table.add_row(row);
        self
    }

    /// Add a row of prepared cells.
    pub fn add_cells(mut self, row: Vec<Cell>) -> Self {
        self.table.add_row(row);
        self
    }

    /// Build and return the formatted table.
    pub fn build(self) -> String {
        self.table.to_string()
    }
}

/// Ranked search hits: rank, score, origin, title and a text preview.
pub fn create_hits_table(hits: &[SearchHit]) -> String {
    let mut builder =
        TableBuilder::new().set_headers(vec!["#", "Score", "Type", "Title", "Preview"]);

    for (rank, hit) in hits.iter().enumerate() {
        let flattened = hit.chunk.content.replace('\n', " ");
        let mut preview = truncate_chars(&flattened, PREVIEW_CHARS).to_string();
        if preview.len() < flattened.len() {
            preview.push('…');
        }

        builder = builder.add_cells(vec![
            Cell::new(rank + 1).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.3}", hit.score)).set_alignment(CellAlignment::Right),
            Cell::new(hit.source_type()),
            Cell::new(&hit.chunk.title),
            Cell::new(preview),
        ]);
    }

    builder.build()
}

/// Index and document statistics as a two-column table.
pub fn create_stats_table(stats: &KnowledgeBaseStats) -> String {
    let rows = [
        ("Indexed chunks", stats.index.entry_count.to_string()),
        ("Embedding model", stats.index.embedding_model.clone()),
        ("Dimension", stats.index.dimension.to_string()),
        ("Backend", format!("{:?}", stats.index.backend).to_lowercase()),
        ("Documents", stats.documents.total_documents.to_string()),
        ("Static documents", stats.documents.static_documents.to_string()),
        ("Online articles", stats.documents.online_documents.to_string()),
        ("Static sources", stats.documents.static_sources.to_string()),
        ("Online sources", stats.documents.online_sources.to_string()),
        ("Chunks on disk", stats.documents.total_chunks.to_string()),
        ("Generated at", stats.generated_at.clone()),
    ];

    rows.into_iter()
        .fold(
            TableBuilder::new().set_headers(vec!["Metric", "Value"]),
            |builder, (metric, value)| builder.add_row(vec![metric.to_string(), value]),
        )
        .build()
}
