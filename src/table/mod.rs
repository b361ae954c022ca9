//! Table Module
//!
//! The string-keyed hash table.
//!
//! ## Responsibilities
//! - Fixed, prime number of buckets chosen at creation
//! - Collision resolution with one AVL tree per bucket
//! - Default value behaviors, captured by entries at insertion time
//! - Releasing owned values through their free behavior on destruction
//!
//! ## Ownership
//! - `put` moves the value into the table; a duplicate key rejects it
//! - `remove` hands the value back *without* running the free behavior
//! - dropping (or `destroy`ing) the table runs each entry's captured free
//!   behavior exactly once

mod entry;
mod tree;

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use serde::Serialize;

use crate::behavior::{
    Bincode, FreeBehavior, PackBehavior, SizeBehavior, ValueFree, ValuePack, ValueSize,
};
use crate::config::Config;
use crate::error::{HashlibError, Result};
use crate::hasher;

pub(crate) use entry::Entry;
use entry::Behaviors;
use tree::{Arena, NodeId};

// =============================================================================
// Capacity Selection
// =============================================================================

/// Largest capacity a table may be created with (2^31)
pub const MAX_CAPACITY: u64 = 1 << 31;

/// Bucket count a request of [`MAX_CAPACITY`] rounds to; the largest bucket
/// count any table can have
pub const MAX_BUCKETS: u64 = 2_147_483_659;

/// Round a requested capacity up to the bucket count actually allocated.
///
/// The request is raised to at least 3, made odd, then advanced by 2 until
/// it is prime.
///
/// ```rust
/// assert_eq!(hashlib::table::next_prime(1000).unwrap(), 1009);
/// assert_eq!(hashlib::table::next_prime(1).unwrap(), 3);
/// ```
pub fn next_prime(requested: u64) -> Result<u64> {
    if requested == 0 || requested > MAX_CAPACITY {
        return Err(HashlibError::InvalidCapacity(requested));
    }

    let mut size = requested.max(3) | 1;
    while !is_prime(size) {
        size += 2;
    }
    Ok(size)
}

/// Trial division by odd divisors; `number` is odd and at least 3
fn is_prime(number: u64) -> bool {
    let mut div = 3;
    while div * div <= number {
        if number % div == 0 {
            return false;
        }
        div += 2;
    }
    true
}

// =============================================================================
// Table
// =============================================================================

/// String-keyed hash table with per-bucket ordered trees
///
/// ```rust
/// use hashlib::Table;
///
/// let mut table: Table<u64> = Table::new(1000).unwrap();
/// assert_eq!(table.capacity(), 1009);
///
/// assert!(table.put("horse", 1));
/// assert!(!table.put("horse", 2)); // duplicate, original kept
/// assert_eq!(table.get("horse"), Some(&1));
/// assert_eq!(table.remove("horse"), Some(1));
/// assert_eq!(table.count(), 0);
/// ```
pub struct Table<V> {
    /// Root of each bucket's tree, `None` for an empty bucket
    buckets: Vec<Option<NodeId>>,

    /// Node pool for all bucket trees
    arena: Arena<V>,

    /// Live entries across all buckets
    count: usize,

    config: Config,

    // Defaults captured by entries inserted from now on
    free_fn: Option<FreeBehavior<V>>,
    size_fn: SizeBehavior<V>,
    pack_fn: PackBehavior<V>,
}

impl<V: Serialize> Table<V> {
    /// Create a table with at least `capacity` buckets and the default flat
    /// codec for persistence
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_config(Config::builder().capacity(capacity).build())
    }

    /// Create a table from a full configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Self::with_behaviors(config, Bincode, Bincode)
    }
}

impl<V> Table<V> {
    /// Create a table with explicit size and pack defaults.
    ///
    /// Needed for value types the default codec cannot encode.
    pub fn with_behaviors(
        config: Config,
        size: impl ValueSize<V> + 'static,
        pack: impl ValuePack<V> + 'static,
    ) -> Result<Self> {
        Self::with_shared_behaviors(config, Rc::new(size), Rc::new(pack))
    }

    pub(crate) fn with_shared_behaviors(
        config: Config,
        size: SizeBehavior<V>,
        pack: PackBehavior<V>,
    ) -> Result<Self> {
        let capacity = next_prime(config.capacity as u64)? as usize;

        let mut buckets = Vec::new();
        buckets.try_reserve_exact(capacity)?;
        buckets.resize(capacity, None);

        tracing::debug!(
            requested = config.capacity,
            capacity,
            "Created hash table"
        );

        Ok(Self {
            buckets,
            arena: Arena::new(),
            count: 0,
            config,
            free_fn: None,
            size_fn: size,
            pack_fn: pack,
        })
    }

    // =========================================================================
    // Entry Operations
    // =========================================================================

    /// Insert `value` under `key`.
    ///
    /// Returns `false` when the key is already present; the stored value is
    /// kept and `value` is dropped without running any free behavior.
    pub fn put(&mut self, key: &str, value: V) -> bool {
        self.try_put(key, value).is_ok()
    }

    /// Insert `value` under `key`, handing `value` back if the key is taken
    pub fn try_put(&mut self, key: &str, value: V) -> std::result::Result<(), V> {
        let slot = self.slot(key);
        let entry = Entry::new(key, value, self.behaviors());

        let (root, rejected) = self.arena.insert(self.buckets[slot], entry);
        self.buckets[slot] = Some(root);

        match rejected {
            Some(entry) => {
                tracing::trace!(key, slot, "Rejected duplicate key");
                Err(entry.into_value())
            }
            None => {
                self.count += 1;
                debug_assert_eq!(self.count, self.arena.len());
                Ok(())
            }
        }
    }

    /// Get the value stored under `key`
    pub fn get(&self, key: &str) -> Option<&V> {
        let id = self.arena.find(self.buckets[self.slot(key)], key)?;
        Some(self.arena.entry(id).value())
    }

    /// Get a mutable reference to the value stored under `key`
    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let id = self.arena.find(self.buckets[self.slot(key)], key)?;
        Some(self.arena.entry_mut(id).value_mut())
    }

    /// Check whether `key` is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove `key` and hand its value back to the caller.
    ///
    /// The entry's free behavior is not run: ownership of the value returns
    /// to the caller.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let slot = self.slot(key);
        let (root, removed) = self.arena.remove(self.buckets[slot], key);
        self.buckets[slot] = root;

        let entry = removed?;
        self.count -= 1;
        Some(entry.into_value())
    }

    /// Destroy the table, running each entry's free behavior.
    ///
    /// Equivalent to dropping the table.
    pub fn destroy(self) {
        drop(self)
    }

    // =========================================================================
    // Behavior Registration
    // =========================================================================

    /// Set the free behavior for entries inserted after this call
    pub fn set_free_function(&mut self, free: impl ValueFree<V> + 'static) {
        self.free_fn = Some(Rc::new(free));
    }

    /// Set the size behavior for entries inserted after this call
    pub fn set_size_function(&mut self, size: impl ValueSize<V> + 'static) {
        self.size_fn = Rc::new(size);
    }

    /// Set the pack behavior for entries inserted after this call
    pub fn set_pack_function(&mut self, pack: impl ValuePack<V> + 'static) {
        self.pack_fn = Rc::new(pack);
    }

    pub(crate) fn set_free_behavior(&mut self, free: Option<FreeBehavior<V>>) {
        self.free_fn = free;
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Write the table to `path` (see [`crate::codec::store`])
    pub fn store(&self, path: impl AsRef<Path>) -> Result<()> {
        crate::codec::store(self, path)
    }

    /// Write the table to any writer (see [`crate::codec::store_to_writer`])
    pub fn store_to_writer<W: Write>(&self, writer: &mut W) -> Result<()> {
        crate::codec::store_to_writer(self, writer)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of live entries
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of buckets (always prime)
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Iterate over `(key, value)` pairs: buckets in index order, keys
    /// ascending within a bucket
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            entries: self.entries(),
        }
    }

    /// Iterate over keys in the same order as [`Table::iter`]
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter().map(|(key, _)| key)
    }

    pub(crate) fn entries(&self) -> Entries<'_, V> {
        Entries {
            table: self,
            bucket: 0,
            cursor: None,
            stack: Vec::new(),
            remaining: self.count,
        }
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn slot(&self, key: &str) -> usize {
        hasher::bucket_index(key, self.buckets.len())
    }

    fn behaviors(&self) -> Behaviors<V> {
        Behaviors {
            free: self.free_fn.clone(),
            size: self.size_fn.clone(),
            pack: self.pack_fn.clone(),
        }
    }
}

impl<V> Drop for Table<V> {
    fn drop(&mut self) {
        let mut released = 0usize;

        for root in std::mem::take(&mut self.buckets).into_iter().flatten() {
            for entry in self.arena.drain(Some(root)) {
                entry.release();
                released += 1;
            }
        }

        self.count = 0;
        tracing::debug!(released, "Destroyed hash table");
    }
}

impl<V: fmt::Debug> fmt::Debug for Table<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, V> IntoIterator for &'a Table<V> {
    type Item = (&'a str, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Iteration
// =============================================================================

/// In-order walk over every bucket tree
pub(crate) struct Entries<'a, V> {
    table: &'a Table<V>,
    /// Next bucket to descend into
    bucket: usize,
    /// Subtree still to be pushed onto the stack
    cursor: Option<NodeId>,
    stack: Vec<NodeId>,
    remaining: usize,
}

impl<'a, V> Iterator for Entries<'a, V> {
    type Item = &'a Entry<V>;

    fn next(&mut self) -> Option<Self::Item> {
        let table: &'a Table<V> = self.table;
        let arena = &table.arena;
        loop {
            while let Some(id) = self.cursor {
                self.stack.push(id);
                self.cursor = arena.children(id).0;
            }

            if let Some(id) = self.stack.pop() {
                self.cursor = arena.children(id).1;
                self.remaining -= 1;
                return Some(arena.entry(id));
            }

            if self.bucket >= table.buckets.len() {
                return None;
            }
            self.cursor = table.buckets[self.bucket];
            self.bucket += 1;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Iterator over the `(key, value)` pairs of a [`Table`]
pub struct Iter<'a, V> {
    entries: Entries<'a, V>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries
            .next()
            .map(|entry| (entry.key(), entry.value()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}
