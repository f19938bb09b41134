//! # QuoteSync Core
//!
//! Quote model and repository for QuoteSync.
//!
//! This crate provides:
//! - [`Quote`] records and the [`CategoryFilter`] used to select them
//! - [`QuoteRepository`], the ordered in-memory list persisted through a
//!   [`quotesync_storage::KeyValueStore`]
//! - JSON import and export of the repository
//!
//! ## Key Invariants
//!
//! - Quote identity is exact equality of `text`; no generated ids
//! - Duplicates are permitted; insertion order is preserved
//! - A missing or unreadable quote list falls back to the built-in seed set
//! - Every mutation is persisted before it is reported as successful

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod quote;
mod repository;

pub use config::RepositoryConfig;
pub use error::{CoreError, CoreResult};
pub use quote::{seed_quotes, CategoryFilter, Quote, ServerId};
pub use repository::QuoteRepository;

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
