//! Paragraph-preserving text chunking.
//!
//! Documents are cut into retrieval units by whole paragraphs. A chunk grows
//! until the next paragraph would push it past the size bound, so a single
//! oversized paragraph is kept intact rather than broken mid-sentence.

mod splitter;

pub use splitter::{Chunker, paragraphs, split, truncate_chars};
