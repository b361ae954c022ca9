//! Table Writer
//!
//! Serializes a table: header first, then one record per entry, buckets in
//! index order and keys ascending within a bucket.

use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::{HashlibError, Result};
use crate::table::Table;

use super::Header;

/// Write `table` to the file at `path`, replacing any existing content.
///
/// Any I/O failure aborts the whole operation; a partially written file is
/// left behind.
pub fn store<V>(table: &Table<V>, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let config = table.config();

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;

    let mut writer = BufWriter::with_capacity(config.io_buffer_size, file);
    let written = write_table(table, &mut writer)?;

    writer.flush()?;
    let file = writer.into_inner().map_err(|e| HashlibError::Io(e.into_error()))?;
    if config.sync_on_store {
        file.sync_all()?;
    }

    tracing::debug!(
        path = %path.display(),
        entries = written,
        capacity = table.capacity(),
        "Stored hash table"
    );

    Ok(())
}

/// Write `table` to an arbitrary writer and flush it
pub fn store_to_writer<V, W: Write>(table: &Table<V>, writer: &mut W) -> Result<()> {
    write_table(table, writer)?;
    writer.flush()?;
    Ok(())
}

/// Write header and records; returns the number of records written
fn write_table<V, W: Write>(table: &Table<V>, out: &mut W) -> Result<u64> {
    let header = Header {
        capacity: table.capacity() as u64,
        count: table.count() as u64,
    };
    header.write_to(out)?;

    let mut written = 0u64;
    for entry in table.entries() {
        let bytes = entry.packed_size()?;
        out.write_all(&(bytes as u64).to_ne_bytes())?;

        // The length prefix is already on disk, so pack must honor it
        let mut counter = CountingWriter::new(out);
        entry.pack(bytes, &mut counter)?;
        if counter.written != bytes as u64 {
            return Err(HashlibError::Codec(format!(
                "pack for key {:?} wrote {} bytes, size reported {}",
                entry.key(),
                counter.written,
                bytes
            )));
        }

        let key = entry.key().as_bytes();
        out.write_all(&(key.len() as u64).to_ne_bytes())?;
        out.write_all(key)?;

        tracing::trace!(key = entry.key(), bytes, "Packed entry");
        written += 1;
    }

    Ok(written)
}

/// Forwards writes and counts the bytes accepted
struct CountingWriter<'w, W: Write + ?Sized> {
    inner: &'w mut W,
    written: u64,
}

impl<'w, W: Write + ?Sized> CountingWriter<'w, W> {
    fn new(inner: &'w mut W) -> Self {
        Self { inner, written: 0 }
    }
}

impl<W: Write + ?Sized> Write for CountingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
