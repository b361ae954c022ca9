//! # hashlib
//!
//! A string-keyed hash table with:
//! - A fixed, prime number of buckets chosen at creation
//! - Collision resolution through one AVL tree per bucket
//! - Pluggable per-entry behaviors (free / size / pack / unpack)
//! - A flat binary persistence format
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Table                              │
//! │              put / get / remove / destroy                   │
//! └──────────┬───────────────────────────────────┬──────────────┘
//!            │                                   │
//!            ▼                                   ▼
//!     ┌─────────────┐                    ┌───────────────┐
//!     │   Hasher    │                    │     Codec     │
//!     │  (FNV-1a)   │                    │ store/retrieve│
//!     └──────┬──────┘                    └───────┬───────┘
//!            │ hash % capacity                   │ size / pack / unpack
//!            ▼                                   ▼
//!     ┌─────────────┐                    ┌───────────────┐
//!     │ Bucket Tree │───────────────────►│    Entries    │
//!     │    (AVL)    │                    │ key + value + │
//!     └─────────────┘                    │   behaviors   │
//!                                        └───────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use hashlib::{codec, Table};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("numbers.hl");
//!
//! let mut table: Table<u32> = Table::new(100).unwrap();
//! table.put("one", 1);
//! table.put("two", 2);
//! table.store(&path).unwrap();
//!
//! let restored: Table<u32> = codec::retrieve(&path, None, None).unwrap();
//! assert_eq!(restored.get("two"), Some(&2));
//! assert_eq!(restored.count(), 2);
//! ```
//!
//! The table is single-threaded: behaviors are reference counted with `Rc`,
//! so a `Table` is neither `Send` nor `Sync`.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod hasher;
pub mod behavior;
pub mod table;
pub mod codec;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{HashlibError, Result};
pub use config::Config;
pub use behavior::{Bincode, ValueCodec, ValueFree, ValuePack, ValueSize, ValueUnpack};
pub use table::Table;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of hashlib
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
