//! Saving and hydrating a persisted index.

use std::fs;
use std::sync::Arc;

use knowbase::index::{LinearIndex, MATRIX_FILE, RECORD_FILE, VectorBackend};
use knowbase::vector::{HashingProvider, VectorDimension};
use tempfile::TempDir;

use crate::common::{chunk, hashing};

fn populated(dir: &TempDir) -> LinearIndex {
    let index = LinearIndex::open(dir.path().join("index"), hashing());
    index
        .add(vec![
            chunk("drs", "The drag reduction system opens a flap in the rear wing"),
            chunk("tyres", "Soft compounds give more grip but wear quickly"),
            chunk("pits", "A pit stop changes all four tyres in under three seconds"),
        ])
        .unwrap();
    index
}

#[test]
fn test_reload_reproduces_ranking() {
    let dir = TempDir::new().unwrap();
    let query = "tyres wear during a pit stop";

    let before = populated(&dir).search(query, 3).unwrap();

    let reloaded = LinearIndex::open(dir.path().join("index"), hashing());
    assert_eq!(reloaded.entry_count(), 3);
    let after = reloaded.search(query, 3).unwrap();

    assert_eq!(before.len(), after.len());
    for (a, b) in before.iter().zip(&after) {
        assert_eq!(a.chunk, b.chunk);
        assert!((a.score - b.score).abs() < 1e-6);
    }
}

#[test]
fn test_artifacts_are_written_together() {
    let dir = TempDir::new().unwrap();
    let index = populated(&dir);
    let persistence = index.persistence().unwrap();

    assert!(persistence.record_path().ends_with(RECORD_FILE));
    assert!(persistence.matrix_path().ends_with(MATRIX_FILE));
    assert!(persistence.exists());
}

#[test]
fn test_clear_persists_empty_state() {
    let dir = TempDir::new().unwrap();
    populated(&dir).clear().unwrap();

    let reloaded = LinearIndex::open(dir.path().join("index"), hashing());
    assert_eq!(reloaded.entry_count(), 0);
}

#[test]
fn test_missing_matrix_hydrates_empty() {
    let dir = TempDir::new().unwrap();
    drop(populated(&dir));
    fs::remove_file(dir.path().join("index").join(MATRIX_FILE)).unwrap();

    let reloaded = LinearIndex::open(dir.path().join("index"), hashing());
    assert_eq!(reloaded.entry_count(), 0);
    assert_eq!(reloaded.matrix_row_count(), 0);
}

#[test]
fn test_truncated_matrix_hydrates_empty() {
    let dir = TempDir::new().unwrap();
    drop(populated(&dir));
    let matrix = dir.path().join("index").join(MATRIX_FILE);
    let bytes = fs::read(&matrix).unwrap();
    fs::write(&matrix, &bytes[..bytes.len() - 4]).unwrap();

    let reloaded = LinearIndex::open(dir.path().join("index"), hashing());
    assert_eq!(reloaded.entry_count(), 0);
}

#[test]
fn test_corrupt_record_hydrates_empty() {
    let dir = TempDir::new().unwrap();
    drop(populated(&dir));
    fs::write(dir.path().join("index").join(RECORD_FILE), "{ not json").unwrap();

    let reloaded = LinearIndex::open(dir.path().join("index"), hashing());
    assert_eq!(reloaded.entry_count(), 0);
}

#[test]
fn test_other_model_hydrates_empty() {
    let dir = TempDir::new().unwrap();
    drop(populated(&dir));

    let narrow = Arc::new(HashingProvider::new(VectorDimension::new(64).unwrap()));
    let reloaded = LinearIndex::open(dir.path().join("index"), narrow);
    assert_eq!(reloaded.entry_count(), 0);
    assert_eq!(reloaded.info().dimension, 64);
}

#[test]
fn test_oversized_matrix_header_hydrates_empty() {
    let dir = TempDir::new().unwrap();
    drop(populated(&dir));

    let mut header = Vec::new();
    header.extend_from_slice(b"KBMX");
    header.extend_from_slice(&knowbase::vector::MATRIX_VERSION.to_le_bytes());
    header.extend_from_slice(&u32::MAX.to_le_bytes());
    header.extend_from_slice(&u32::MAX.to_le_bytes());
    fs::write(dir.path().join("index").join(MATRIX_FILE), header).unwrap();

    let reloaded = LinearIndex::open(dir.path().join("index"), hashing());
    assert_eq!(reloaded.entry_count(), 0);
}
