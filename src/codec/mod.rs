//! Persistence Codec
//!
//! Flat binary snapshot of a table.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (24 bytes)                                       │
//! │   Magic: 0xB011544A (8) | Capacity (8) | Count (8)      │
//! ├─────────────────────────────────────────────────────────┤
//! │ Records (variable)                                      │
//! │   [ValueLen: u64][Value][KeyLen: u64][Key]              │
//! │   ... repeated for each entry ...                       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are native byte order with no padding. Keys carry no
//! terminator. There is no footer: the records end where the stream ends.
//! The count in the header is advisory; readers are driven by end of stream.
//!
//! Values are encoded by each entry's captured pack behavior and decoded by
//! the unpack behavior handed to [`retrieve`] or, with matching size and pack
//! behaviors, the [`ValueCodec`](crate::behavior::ValueCodec) handed to
//! [`retrieve_with_behaviors`].

mod reader;
mod writer;

use std::io::{self, Read, Write};

use crate::error::{HashlibError, Result};

pub use reader::{
    retrieve, retrieve_from_reader, retrieve_from_reader_with_behaviors, retrieve_with_behaviors,
    retrieve_with_config, Record, RecordReader,
};
pub use writer::{store, store_to_writer};

// =============================================================================
// Shared Constants
// =============================================================================

/// Magic number identifying a hashlib file
pub const MAGIC: u64 = 0xB011_544A;

/// Header size: Magic (8) + Capacity (8) + Count (8) = 24 bytes
pub const HEADER_SIZE: u64 = 24;

/// Size of every length prefix in a record
pub(crate) const PREFIX_SIZE: usize = 8;

// =============================================================================
// Header
// =============================================================================

/// Decoded file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Bucket count of the stored table
    pub capacity: u64,
    /// Entry count recorded at store time
    pub count: u64,
}

impl Header {
    pub(crate) fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(&MAGIC.to_ne_bytes())?;
        out.write_all(&self.capacity.to_ne_bytes())?;
        out.write_all(&self.count.to_ne_bytes())
    }

    pub(crate) fn read_from<R: Read + ?Sized>(input: &mut R) -> Result<Self> {
        let magic = read_u64(input, "magic")?;
        if magic != MAGIC {
            return Err(HashlibError::BadMagic(magic));
        }

        let capacity = read_u64(input, "capacity")?;
        let count = read_u64(input, "entry count")?;
        Ok(Self { capacity, count })
    }
}

/// Read one native-endian u64, naming the field in the truncation error
pub(crate) fn read_u64<R: Read + ?Sized>(input: &mut R, field: &str) -> Result<u64> {
    let mut buf = [0u8; PREFIX_SIZE];
    input.read_exact(&mut buf).map_err(|e| truncated(e, field))?;
    Ok(u64::from_ne_bytes(buf))
}

/// Map an unexpected EOF to `Truncated`, everything else to `Io`
pub(crate) fn truncated(err: io::Error, field: &str) -> HashlibError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        HashlibError::Truncated(format!("stream ended inside {}", field))
    } else {
        HashlibError::Io(err)
    }
}
