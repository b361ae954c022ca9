//! Table entries
//!
//! An entry owns its key and value plus the behaviors captured from the table
//! at insertion time.

use std::io::{self, Write};

use crate::behavior::{FreeBehavior, PackBehavior, SizeBehavior};
use crate::error::Result;

/// Behaviors captured by an entry when it is inserted
pub(crate) struct Behaviors<V> {
    pub(crate) free: Option<FreeBehavior<V>>,
    pub(crate) size: SizeBehavior<V>,
    pub(crate) pack: PackBehavior<V>,
}

// Manual impl: deriving would require `V: Clone`.
impl<V> Clone for Behaviors<V> {
    fn clone(&self) -> Self {
        Self {
            free: self.free.clone(),
            size: self.size.clone(),
            pack: self.pack.clone(),
        }
    }
}

/// A stored key/value pair
pub(crate) struct Entry<V> {
    key: Box<str>,
    value: V,
    behaviors: Behaviors<V>,
}

impl<V> Entry<V> {
    /// Create an entry holding a private copy of `key`
    pub(crate) fn new(key: &str, value: V, behaviors: Behaviors<V>) -> Self {
        Self {
            key: key.into(),
            value,
            behaviors,
        }
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn value(&self) -> &V {
        &self.value
    }

    pub(crate) fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// Hand the value back without running the free behavior
    pub(crate) fn into_value(self) -> V {
        self.value
    }

    /// Destroy the entry, passing the value to its captured free behavior
    /// when one was set
    pub(crate) fn release(self) {
        match self.behaviors.free {
            Some(free) => free.free(self.value),
            None => drop(self.value),
        }
    }

    /// Bytes the captured pack behavior will emit for this value
    pub(crate) fn packed_size(&self) -> Result<usize> {
        self.behaviors.size.size(&self.value)
    }

    /// Pack the value with the captured pack behavior
    pub(crate) fn pack(&self, bytes: usize, out: &mut dyn Write) -> io::Result<()> {
        self.behaviors.pack.pack(&self.value, bytes, out)
    }
}
