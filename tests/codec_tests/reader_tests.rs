//! Record Reader Tests
//!
//! Tests verify:
//! - Header access before any record is read
//! - Records come back in store order with raw value bytes
//! - Clean end of stream vs. truncation
//! - Iterator stops after the first error

use std::io::Cursor;

use hashlib::codec::{Header, Record, RecordReader, HEADER_SIZE, MAGIC};
use hashlib::{HashlibError, Table};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn stored_bytes(count: u32) -> Vec<u8> {
    let mut table: Table<u32> = Table::new(5).unwrap();
    for i in 0..count {
        table.put(&format!("key{:03}", i), i);
    }
    let mut buf = Vec::new();
    table.store_to_writer(&mut buf).unwrap();
    buf
}

// =============================================================================
// Header Tests
// =============================================================================

#[test]
fn test_reader_exposes_header() {
    let reader = RecordReader::new(Cursor::new(stored_bytes(12))).unwrap();
    assert_eq!(
        reader.header(),
        Header {
            capacity: 5,
            count: 12
        }
    );
    assert_eq!(reader.records_read(), 0);
}

#[test]
fn test_reader_rejects_bad_magic() {
    let mut bytes = stored_bytes(1);
    bytes[0] ^= 0xFF;

    let result = RecordReader::new(Cursor::new(bytes));
    assert!(matches!(result, Err(HashlibError::BadMagic(_))));
}

#[test]
fn test_header_only_stream_has_no_records() {
    let bytes = stored_bytes(0);
    assert_eq!(bytes.len() as u64, HEADER_SIZE);

    let mut reader = RecordReader::new(Cursor::new(bytes)).unwrap();
    assert!(reader.next_record().unwrap().is_none());
    assert!(reader.next().is_none());
}

// =============================================================================
// Record Tests
// =============================================================================

#[test]
fn test_reader_returns_raw_records() {
    let reader = RecordReader::new(Cursor::new(stored_bytes(20))).unwrap();
    let records: Vec<Record> = reader.map(|r| r.unwrap()).collect();

    assert_eq!(records.len(), 20);
    for record in &records {
        let index: u32 = record.key[3..].parse().unwrap();
        assert_eq!(record.value, index.to_le_bytes().to_vec());
    }
}

#[test]
fn test_reader_follows_table_order() {
    let mut table: Table<u32> = Table::new(5).unwrap();
    for i in 0..30 {
        table.put(&format!("k{}", i), i);
    }
    let mut buf = Vec::new();
    table.store_to_writer(&mut buf).unwrap();

    let stored: Vec<String> = RecordReader::new(Cursor::new(buf))
        .unwrap()
        .map(|r| r.unwrap().key)
        .collect();
    let walked: Vec<String> = table.keys().map(str::to_string).collect();
    assert_eq!(stored, walked);
}

#[test]
fn test_iterator_stops_after_error() {
    let mut bytes = stored_bytes(3);
    bytes.truncate(bytes.len() - 2);

    let mut reader = RecordReader::new(Cursor::new(bytes)).unwrap();
    assert!(reader.next().unwrap().is_ok());
    assert!(reader.next().unwrap().is_ok());
    assert!(matches!(reader.next(), Some(Err(HashlibError::Truncated(_)))));
    assert!(reader.next().is_none());
    assert_eq!(reader.records_read(), 2);
}

#[test]
fn test_reader_open_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("open.hl");

    let mut table: Table<u32> = Table::new(3).unwrap();
    table.put("a", 1);
    table.store(&path).unwrap();

    let mut reader = RecordReader::open(&path, 4096).unwrap();
    assert_eq!(reader.header().count, 1);
    let record = reader.next_record().unwrap().unwrap();
    assert_eq!(record.key, "a");
    assert_eq!(record.value, 1u32.to_le_bytes().to_vec());
    assert!(reader.next_record().unwrap().is_none());
}

#[test]
fn test_magic_constant() {
    assert_eq!(MAGIC, 0xB011544A);
}
