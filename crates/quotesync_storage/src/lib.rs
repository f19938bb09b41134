//! # QuoteSync Storage
//!
//! Key-value store trait and backends for QuoteSync.
//!
//! This crate provides the lowest-level persistence abstraction. Stores are
//! **opaque string maps** - they do not interpret the values they hold.
//!
//! ## Design Principles
//!
//! - Stores are simple string maps (get, set, remove)
//! - No knowledge of quote records or JSON layouts of values
//! - Must be `Send + Sync` so they can be shared with the sync engine
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - Session-scoped, ephemeral storage (and tests)
//! - [`FileStore`] - Durable storage backed by a JSON file
//!
//! [`DirLock`] keeps a second process from opening the same data directory.
//!
//! ## Example
//!
//! ```rust
//! use quotesync_storage::{InMemoryStore, KeyValueStore};
//!
//! let store = InMemoryStore::new();
//! store.set("greeting", "hello").unwrap();
//! assert_eq!(store.get("greeting").unwrap().as_deref(), Some("hello"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod lock;
mod memory;

pub use backend::KeyValueStore;
pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use lock::DirLock;
pub use memory::InMemoryStore;
