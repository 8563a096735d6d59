use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::ChunkingConfig;
use crate::types::SourceType;

/// Markdown heading lines (`# Title`, `## Section`, ...).
static HEADING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#+ .+$").expect("heading pattern is valid"));

/// Separator placed between paragraphs inside a chunk.
const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Splits `text` into ordered chunks of at most `max_chunk_size` characters.
///
/// Headings are stripped from static documents so titles are not repeated in
/// body text. The bound is soft: a paragraph longer than the bound becomes a
/// chunk of its own. When nothing survives the paragraph pass the first
/// `max_chunk_size` characters of the input text are returned as a single
/// chunk. Blank input yields no chunks.
pub fn split(text: &str, source_type: SourceType, max_chunk_size: usize) -> Vec<String> {
    let max_chunk_size = max_chunk_size.max(1);

    let body: Cow<'_, str> = match source_type {
        SourceType::Static => HEADING_LINE.replace_all(text, ""),
        SourceType::Online => Cow::Borrowed(text),
    };

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for paragraph in paragraphs(&body) {
        let paragraph_len = paragraph.chars().count();

        if current_len > 0
            && current_len + PARAGRAPH_SEPARATOR.len() + paragraph_len > max_chunk_size
        {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if current_len > 0 {
            current.push_str(PARAGRAPH_SEPARATOR);
            current_len += PARAGRAPH_SEPARATOR.len();
        }
        current.push_str(&paragraph);
        current_len += paragraph_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    if chunks.is_empty() {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            chunks.push(truncate_chars(trimmed, max_chunk_size).to_string());
        }
    }

    chunks
}

/// Breaks text into trimmed, non-empty paragraphs.
///
/// Whitespace-only lines count as blank, and any run of blank lines is a
/// single paragraph boundary.
pub fn paragraphs(text: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            flush_paragraph(&mut lines, &mut result);
        } else {
            lines.push(line.trim_end_matches('\r'));
        }
    }
    flush_paragraph(&mut lines, &mut result);

    result
}

fn flush_paragraph(lines: &mut Vec<&str>, out: &mut Vec<String>) {
    if lines.is_empty() {
        return;
    }
    let paragraph = lines.join("\n");
    let trimmed = paragraph.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
    lines.clear();
}

/// Returns the prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Chunker bound to the configured per-source size limits.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Chunks `text` with the size bound for `source_type`.
    pub fn chunk(&self, text: &str, source_type: SourceType) -> Vec<String> {
        split(text, source_type, self.config.max_size_for(source_type))
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(ChunkingConfig::default())
    }
}
