//! Table Reader
//!
//! Streams records back out of a stored table and rebuilds tables from them.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::behavior::{FreeBehavior, UnpackBehavior, ValueCodec, ValueUnpack};
use crate::config::Config;
use crate::error::{HashlibError, Result};
use crate::table::{Table, MAX_BUCKETS, MAX_CAPACITY};

use super::{read_u64, truncated, Header, PREFIX_SIZE};

/// Upper bound on the buffer reserved up front for one value or key. Larger
/// fields grow while reading so a corrupt length cannot force a huge
/// allocation before the data is seen.
const PREALLOC_LIMIT: u64 = 64 * 1024;

/// One raw record: the key and the packed value bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    pub value: Vec<u8>,
}

// =============================================================================
// Record Reader
// =============================================================================

/// Sequential reader over the records of a stored table
///
/// The header is read and validated on construction.
pub struct RecordReader<R: Read> {
    input: R,
    header: Header,
    records_read: u64,
    /// Set after an error or end of stream; the iterator then yields nothing
    done: bool,
}

impl RecordReader<BufReader<File>> {
    /// Open a stored table file
    pub fn open(path: &Path, buffer_size: usize) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::with_capacity(buffer_size, file))
    }
}

impl<R: Read> RecordReader<R> {
    /// Read and validate the header from `input`
    pub fn new(mut input: R) -> Result<Self> {
        let header = Header::read_from(&mut input)?;
        Ok(Self {
            input,
            header,
            records_read: 0,
            done: false,
        })
    }

    pub fn header(&self) -> Header {
        self.header
    }

    /// Number of records returned so far
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Read the next record; `Ok(None)` at a clean end of stream
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        let Some(value_len) = self.read_prefix()? else {
            return Ok(None);
        };
        let value = self.read_field(value_len, "value bytes")?;

        let key_len = read_u64(&mut self.input, "key length")?;
        let key = self.read_field(key_len, "key bytes")?;
        let key = String::from_utf8(key).map_err(|e| {
            HashlibError::Codec(format!(
                "record {}: key is not valid UTF-8: {}",
                self.records_read, e
            ))
        })?;

        self.records_read += 1;
        Ok(Some(Record { key, value }))
    }

    /// Read a value length prefix, telling a clean end of stream (no bytes)
    /// apart from a prefix that was cut short
    fn read_prefix(&mut self) -> Result<Option<u64>> {
        let mut buf = [0u8; PREFIX_SIZE];
        let mut filled = 0;

        while filled < PREFIX_SIZE {
            match self.input.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        match filled {
            0 => Ok(None),
            PREFIX_SIZE => Ok(Some(u64::from_ne_bytes(buf))),
            n => Err(HashlibError::Truncated(format!(
                "record {}: length prefix cut off after {} of {} bytes",
                self.records_read, n, PREFIX_SIZE
            ))),
        }
    }

    /// Read exactly `len` bytes
    fn read_field(&mut self, len: u64, field: &str) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(len.min(PREALLOC_LIMIT) as usize)?;

        let read = (&mut self.input)
            .take(len)
            .read_to_end(&mut buf)
            .map_err(|e| truncated(e, field))?;

        if (read as u64) < len {
            return Err(HashlibError::Truncated(format!(
                "record {}: expected {} {}, found {}",
                self.records_read, len, field, read
            )));
        }
        Ok(buf)
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

// =============================================================================
// Table Retrieval
// =============================================================================

/// Rebuild a table of serde values from the file at `path` with the default
/// configuration.
///
/// `unpack` decodes each value (the bincode flat codec when `None`); `free`
/// becomes the rebuilt table's free behavior. Rebuilt entries pack with
/// bincode, so a table read with a custom `unpack` is stored again as
/// bincode; use [`retrieve_with_behaviors`] to keep a custom encoding.
pub fn retrieve<V>(
    path: impl AsRef<Path>,
    unpack: Option<UnpackBehavior<V>>,
    free: Option<FreeBehavior<V>>,
) -> Result<Table<V>>
where
    V: Serialize + DeserializeOwned,
{
    retrieve_with_config(path, Config::default(), unpack, free)
}

/// Rebuild a table of serde values from the file at `path`.
///
/// `config.capacity` is ignored: the stored capacity is used.
pub fn retrieve_with_config<V>(
    path: impl AsRef<Path>,
    config: Config,
    unpack: Option<UnpackBehavior<V>>,
    free: Option<FreeBehavior<V>>,
) -> Result<Table<V>>
where
    V: Serialize + DeserializeOwned,
{
    retrieve_with_behaviors(path, config, default_codec(unpack), free)
}

/// Rebuild a table of serde values from any reader positioned at a header
pub fn retrieve_from_reader<V, R>(
    input: R,
    config: Config,
    unpack: Option<UnpackBehavior<V>>,
    free: Option<FreeBehavior<V>>,
) -> Result<Table<V>>
where
    V: Serialize + DeserializeOwned,
    R: Read,
{
    retrieve_from_reader_with_behaviors(input, config, default_codec(unpack), free)
}

/// Rebuild a table from the file at `path`, decoding values with `codec`.
///
/// Works for any value type; rebuilt entries pack with the codec's size and
/// pack behaviors.
pub fn retrieve_with_behaviors<V>(
    path: impl AsRef<Path>,
    config: Config,
    codec: ValueCodec<V>,
    free: Option<FreeBehavior<V>>,
) -> Result<Table<V>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let input = BufReader::with_capacity(config.io_buffer_size, file);

    let table = retrieve_from_reader_with_behaviors(input, config, codec, free)?;

    tracing::debug!(
        path = %path.display(),
        entries = table.count(),
        capacity = table.capacity(),
        "Retrieved hash table"
    );

    Ok(table)
}

/// Rebuild a table from any reader positioned at a header, decoding values
/// with `codec`
pub fn retrieve_from_reader_with_behaviors<V, R>(
    input: R,
    config: Config,
    codec: ValueCodec<V>,
    free: Option<FreeBehavior<V>>,
) -> Result<Table<V>>
where
    R: Read,
{
    let mut records = RecordReader::new(input)?;
    let header = records.header();

    let capacity = requested_capacity(header.capacity)?;
    let strict_count = config.strict_count;
    let ValueCodec { size, pack, unpack } = codec;

    let mut table = Table::with_shared_behaviors(Config { capacity, ..config }, size, pack)?;
    if table.capacity() as u64 != header.capacity {
        tracing::warn!(
            stored = header.capacity,
            actual = table.capacity(),
            "Stored capacity is not prime, bucket count differs"
        );
    }
    table.set_free_behavior(free.clone());

    while let Some(record) = records.next_record()? {
        let value = unpack.unpack(&record.value)?;
        tracing::trace!(key = %record.key, bytes = record.value.len(), "Unpacked entry");

        if let Err(value) = table.try_put(&record.key, value) {
            tracing::warn!(key = %record.key, "Duplicate key in stream, keeping first value");
            match &free {
                Some(free) => free.free(value),
                None => drop(value),
            }
        }
    }

    let loaded = records.records_read();
    if loaded != header.count {
        if strict_count {
            return Err(HashlibError::CountMismatch {
                expected: header.count,
                actual: loaded,
            });
        }
        tracing::warn!(
            expected = header.count,
            actual = loaded,
            "Header entry count does not match records"
        );
    }

    Ok(table)
}

// =============================================================================
// Private Helpers
// =============================================================================

/// Bincode size/pack with the given unpack, or bincode throughout
fn default_codec<V>(unpack: Option<UnpackBehavior<V>>) -> ValueCodec<V>
where
    V: Serialize + DeserializeOwned,
{
    let codec = ValueCodec::bincode();
    match unpack {
        Some(unpack) => ValueCodec { unpack, ..codec },
        None => codec,
    }
}

/// Capacity to request for a stored bucket count.
///
/// Stored counts above [`MAX_CAPACITY`] up to [`MAX_BUCKETS`] come from a
/// table created at the maximum request, so they map back to that request.
fn requested_capacity(stored: u64) -> Result<usize> {
    let requested = if stored > MAX_CAPACITY && stored <= MAX_BUCKETS {
        MAX_CAPACITY
    } else {
        stored
    };
    usize::try_from(requested).map_err(|_| HashlibError::InvalidCapacity(stored))
}
