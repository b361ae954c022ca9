//! Value Behaviors
//!
//! Pluggable per-entry behaviors: how a value is released, how large its
//! packed form is, and how it is packed to / unpacked from a byte stream.
//!
//! A table keeps one default of each and every entry captures the defaults
//! that were active when it was inserted. Changing a default later does not
//! touch entries that are already stored.
//!
//! Closures implement the traits directly:
//!
//! ```rust
//! use std::io::Write;
//! use hashlib::Table;
//!
//! let mut table: Table<u32> = Table::new(17).unwrap();
//! table.set_size_function(|_: &u32| -> usize { 4 });
//! table.set_pack_function(|v: &u32, _bytes: usize, out: &mut dyn Write| {
//!     out.write_all(&v.to_be_bytes())
//! });
//! assert!(table.put("answer", 42));
//! ```

use std::io::{self, Write};
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

// =============================================================================
// Behavior Traits
// =============================================================================

/// Releases a value the table owns when the table is destroyed
pub trait ValueFree<V> {
    fn free(&self, value: V);
}

/// Number of bytes [`ValuePack::pack`] emits for a value
pub trait ValueSize<V> {
    fn size(&self, value: &V) -> Result<usize>;
}

/// Writes exactly `bytes` bytes describing `value` to `out`
pub trait ValuePack<V> {
    fn pack(&self, value: &V, bytes: usize, out: &mut dyn Write) -> io::Result<()>;
}

/// Rebuilds a value from the bytes written by the matching pack behavior
pub trait ValueUnpack<V> {
    fn unpack(&self, bytes: &[u8]) -> Result<V>;
}

/// Shared handle to a free behavior
pub type FreeBehavior<V> = Rc<dyn ValueFree<V>>;

/// Shared handle to a size behavior
pub type SizeBehavior<V> = Rc<dyn ValueSize<V>>;

/// Shared handle to a pack behavior
pub type PackBehavior<V> = Rc<dyn ValuePack<V>>;

/// Shared handle to an unpack behavior
pub type UnpackBehavior<V> = Rc<dyn ValueUnpack<V>>;

// =============================================================================
// Closure Implementations
// =============================================================================

impl<V, F> ValueFree<V> for F
where
    F: Fn(V),
{
    fn free(&self, value: V) {
        self(value)
    }
}

impl<V, F> ValueSize<V> for F
where
    F: Fn(&V) -> usize,
{
    fn size(&self, value: &V) -> Result<usize> {
        Ok(self(value))
    }
}

impl<V, F> ValuePack<V> for F
where
    F: Fn(&V, usize, &mut dyn Write) -> io::Result<()>,
{
    fn pack(&self, value: &V, bytes: usize, out: &mut dyn Write) -> io::Result<()> {
        self(value, bytes, out)
    }
}

impl<V, F> ValueUnpack<V> for F
where
    F: Fn(&[u8]) -> Result<V>,
{
    fn unpack(&self, bytes: &[u8]) -> Result<V> {
        self(bytes)
    }
}

// =============================================================================
// Value Codec
// =============================================================================

/// Size, pack and unpack behaviors that agree on one encoding.
///
/// Retrieving with a codec gives every rebuilt entry the codec's size and
/// pack behaviors, so a loaded table is stored again in the encoding it was
/// read with.
///
/// ```rust
/// use std::io::Write;
/// use hashlib::behavior::{ValueCodec, ValueUnpack};
///
/// let codec: ValueCodec<String> = ValueCodec::new(
///     |s: &String| -> usize { s.len() },
///     |s: &String, _bytes: usize, out: &mut dyn Write| out.write_all(s.as_bytes()),
///     |bytes: &[u8]| -> hashlib::Result<String> {
///         String::from_utf8(bytes.to_vec())
///             .map_err(|e| hashlib::HashlibError::Codec(e.to_string()))
///     },
/// );
/// assert_eq!(codec.unpack.unpack(b"raw").unwrap(), "raw");
/// ```
pub struct ValueCodec<V> {
    pub size: SizeBehavior<V>,
    pub pack: PackBehavior<V>,
    pub unpack: UnpackBehavior<V>,
}

impl<V> ValueCodec<V> {
    pub fn new(
        size: impl ValueSize<V> + 'static,
        pack: impl ValuePack<V> + 'static,
        unpack: impl ValueUnpack<V> + 'static,
    ) -> Self {
        Self {
            size: Rc::new(size),
            pack: Rc::new(pack),
            unpack: Rc::new(unpack),
        }
    }
}

impl<V: Serialize + DeserializeOwned> ValueCodec<V> {
    /// The bincode flat codec for all three behaviors
    pub fn bincode() -> Self {
        Self::new(Bincode, Bincode, Bincode)
    }
}

impl<V> Clone for ValueCodec<V> {
    fn clone(&self) -> Self {
        Self {
            size: Rc::clone(&self.size),
            pack: Rc::clone(&self.pack),
            unpack: Rc::clone(&self.unpack),
        }
    }
}

// =============================================================================
// Default Flat Codec
// =============================================================================

/// Default size/pack/unpack behavior: bincode with fixed-width integers.
///
/// Only suitable for flat values whose encoding does not depend on anything
/// outside the value itself. Values holding handles to other data need
/// caller-supplied behaviors.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bincode;

impl<V: Serialize> ValueSize<V> for Bincode {
    fn size(&self, value: &V) -> Result<usize> {
        Ok(bincode::serialized_size(value)? as usize)
    }
}

impl<V: Serialize> ValuePack<V> for Bincode {
    fn pack(&self, value: &V, _bytes: usize, out: &mut dyn Write) -> io::Result<()> {
        bincode::serialize_into(out, value).map_err(|err| match *err {
            bincode::ErrorKind::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
        })
    }
}

impl<V: DeserializeOwned> ValueUnpack<V> for Bincode {
    fn unpack(&self, bytes: &[u8]) -> Result<V> {
        Ok(bincode::deserialize(bytes)?)
    }
}
