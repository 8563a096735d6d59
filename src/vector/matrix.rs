//! Dense row-major embedding matrix and its on-disk form.
//!
//! # File Format
//!
//! - Header (16 bytes): magic `KBMX`, version, dimension, row count
//!   (all u32 little-endian)
//! - Body: `rows * dimension` f32 values, little-endian, row-major
//!
//! Reads go through a memory map; writes go to a temporary file in the same
//! directory which is then renamed over the target.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use memmap2::MmapOptions;
use tempfile::NamedTempFile;

use crate::vector::{VectorDimension, VectorError};

/// Current matrix file format version.
pub const MATRIX_VERSION: u32 = 1;

/// Size of the matrix header in bytes.
const HEADER_SIZE: usize = 16;

/// Magic bytes identifying embedding matrix files.
const MAGIC_BYTES: &[u8; 4] = b"KBMX";

const BYTES_PER_F32: usize = 4;

/// Embedding rows stored contiguously.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    dimension: VectorDimension,
    data: Vec<f32>,
}

impl EmbeddingMatrix {
    /// Creates an empty matrix of the given width.
    pub fn new(dimension: VectorDimension) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// Builds a matrix from rows, validating every row first.
    pub fn from_rows(dimension: VectorDimension, rows: &[Vec<f32>]) -> Result<Self, VectorError> {
        let mut matrix = Self::new(dimension);
        matrix.push_rows(rows)?;
        Ok(matrix)
    }

    /// Appends rows. Either every row is appended or, on a width mismatch,
    /// none is.
    pub fn push_rows(&mut self, rows: &[Vec<f32>]) -> Result<(), VectorError> {
        for row in rows {
            self.dimension.validate_vector(row)?;
        }
        self.data.reserve(rows.len() * self.dimension.get());
        for row in rows {
            self.data.extend_from_slice(row);
        }
        Ok(())
    }

    pub fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    pub fn row_count(&self) -> usize {
        self.data.len() / self.dimension.get()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row `index`, or `None` when out of range.
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        let width = self.dimension.get();
        let start = index.checked_mul(width)?;
        self.data.get(start..start + width)
    }

    /// Iterates rows in insertion order.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dimension.get())
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

/// Writes `matrix` to `path` through a temp file and rename.
pub fn write_matrix(path: &Path, matrix: &EmbeddingMatrix) -> Result<(), VectorError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let row_count = u32::try_from(matrix.row_count()).map_err(|_| {
        VectorError::InvalidFormat(format!("{} rows exceed the format limit", matrix.row_count()))
    })?;
    let dimension = u32::try_from(matrix.dimension().get()).map_err(|_| {
        VectorError::InvalidFormat(format!("dimension {} exceeds the format limit", matrix.dimension()))
    })?;

    let temp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        writer.write_all(MAGIC_BYTES)?;
        writer.write_all(&MATRIX_VERSION.to_le_bytes())?;
        writer.write_all(&dimension.to_le_bytes())?;
        writer.write_all(&row_count.to_le_bytes())?;
        for value in &matrix.data {
            writer.write_all(&value.to_le_bytes())?;
        }
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| VectorError::Storage(e.error))?;

    Ok(())
}

/// Reads a matrix file written by [`write_matrix`].
pub fn read_matrix(path: &Path) -> Result<EmbeddingMatrix, VectorError> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len() as usize;
    if file_len < HEADER_SIZE {
        return Err(VectorError::InvalidFormat(format!(
            "{} is {file_len} bytes, shorter than the header",
            path.display()
        )));
    }

    // SAFETY: the file is only replaced by rename, never truncated in place,
    // and the mapping is dropped before this function returns.
    let mmap = unsafe { MmapOptions::new().map(&file)? };

    if &mmap[0..4] != MAGIC_BYTES {
        return Err(VectorError::InvalidFormat(
            "missing KBMX magic bytes".to_string(),
        ));
    }

    let version = read_u32(&mmap, 4);
    if version != MATRIX_VERSION {
        return Err(VectorError::VersionMismatch {
            expected: MATRIX_VERSION,
            actual: version,
        });
    }

    let dimension = VectorDimension::new(read_u32(&mmap, 8) as usize)?;
    let rows = read_u32(&mmap, 12) as usize;

    let expected_len = rows
        .checked_mul(dimension.get())
        .and_then(|values| values.checked_mul(BYTES_PER_F32))
        .and_then(|bytes| bytes.checked_add(HEADER_SIZE))
        .ok_or_else(|| {
            VectorError::InvalidFormat(format!(
                "header of {} declares {rows} rows of {dimension}, which overflows",
                path.display()
            ))
        })?;
    if file_len != expected_len {
        return Err(VectorError::InvalidFormat(format!(
            "expected {expected_len} bytes for {rows} rows of {dimension}, found {file_len}"
        )));
    }

    let data = mmap[HEADER_SIZE..]
        .chunks_exact(BYTES_PER_F32)
        .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .collect();

    Ok(EmbeddingMatrix { dimension, data })
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
