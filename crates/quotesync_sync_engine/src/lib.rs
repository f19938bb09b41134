//! # QuoteSync Sync Engine
//!
//! Reconciles the local quote repository with a remote collection.
//!
//! This crate provides:
//! - Remote transport abstraction with an HTTP implementation
//! - The merge of local and remote quote sets
//! - Conflict sessions for user-mediated resolution
//! - A sync engine with an in-flight guard and request timeout
//! - A cancellable periodic scheduler
//!
//! ## Sync cycle
//!
//! 1. Fetch a capped batch of remote items and map them to quotes
//! 2. Merge: remote quotes first, then local quotes with no text match
//! 3. No conflicts: commit the merged set right away
//! 4. Conflicts: return a [`ConflictSession`]; the merged set is committed
//!    once every conflict has been resolved
//!
//! ## Key Invariants
//!
//! - A failed cycle never mutates the repository
//! - Nothing is committed while a conflict is pending
//! - At most one cycle is in flight per engine
//! - A session older than the last committed cycle cannot commit

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod conflict;
mod engine;
mod error;
mod http;
mod merge;
mod scheduler;
mod transport;

pub use config::{SyncConfig, DEFAULT_SERVER_URL};
pub use conflict::{Conflict, ConflictChoice, ConflictSession, Resolution};
pub use engine::{SharedRepository, SyncEngine, SyncOutcome, SyncReport, SyncState, SyncStats};
pub use error::{SyncError, SyncResult};
pub use http::HttpTransport;
pub use merge::{merge_quotes, quotes_from_posts, MergeResult};
pub use scheduler::SyncScheduler;
pub use transport::{MockTransport, QuoteTransport, RemotePost};
