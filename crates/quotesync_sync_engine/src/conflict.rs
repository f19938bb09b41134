//! Conflict detection results and user-mediated resolution.

use crate::engine::{EngineShared, SharedRepository, SyncReport};
use crate::error::{SyncError, SyncResult};
use quotesync_core::Quote;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// A local and a server quote with the same text but different categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// The quote as stored locally.
    pub local: Quote,
    /// The quote as derived from the remote collection.
    pub server: Quote,
}

/// Which side of a conflict to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictChoice {
    /// Keep the local quote.
    KeepLocal,
    /// Keep the server quote.
    KeepServer,
}

impl FromStr for ConflictChoice {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("local") {
            Ok(ConflictChoice::KeepLocal)
        } else if s.eq_ignore_ascii_case("server") {
            Ok(ConflictChoice::KeepServer)
        } else {
            Err(SyncError::InvalidChoice(s.to_string()))
        }
    }
}

impl fmt::Display for ConflictChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictChoice::KeepLocal => f.write_str("local"),
            ConflictChoice::KeepServer => f.write_str("server"),
        }
    }
}

/// State of a session after a resolution step.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Conflicts remain; nothing has been committed.
    Pending {
        /// Number of unresolved conflicts.
        remaining: usize,
    },
    /// The last conflict was resolved and the merged set committed.
    Committed(SyncReport),
}

/// The conflicts of one sync cycle together with its in-progress merged
/// set.
///
/// Returned by [`crate::SyncEngine::run_sync`] when the cycle found
/// conflicts. Each conflict is resolved exactly once; when the last one is
/// resolved the merged set replaces the repository contents. Until then the
/// repository is untouched.
///
/// If committing fails (storage error), the resolutions are kept and
/// [`ConflictSession::commit`] may be called again. A session whose cycle
/// has been overtaken by a newer committed cycle can no longer commit.
pub struct ConflictSession {
    generation: u64,
    conflicts: Vec<Conflict>,
    choices: Vec<Option<ConflictChoice>>,
    merged: Vec<Quote>,
    fetched: usize,
    kept_local: usize,
    started: Instant,
    committed: bool,
    repository: SharedRepository,
    shared: Arc<EngineShared>,
}

impl fmt::Debug for ConflictSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConflictSession")
            .field("generation", &self.generation)
            .field("conflicts", &self.conflicts)
            .field("choices", &self.choices)
            .field("merged", &self.merged)
            .field("committed", &self.committed)
            .finish_non_exhaustive()
    }
}

impl ConflictSession {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        generation: u64,
        conflicts: Vec<Conflict>,
        merged: Vec<Quote>,
        fetched: usize,
        kept_local: usize,
        started: Instant,
        repository: SharedRepository,
        shared: Arc<EngineShared>,
    ) -> Self {
        let choices = vec![None; conflicts.len()];
        Self {
            generation,
            conflicts,
            choices,
            merged,
            fetched,
            kept_local,
            started,
            committed: false,
            repository,
            shared,
        }
    }

    /// Returns every conflict of the cycle in detection order.
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// Returns the unresolved conflicts with their indices.
    pub fn pending(&self) -> impl Iterator<Item = (usize, &Conflict)> + '_ {
        self.conflicts
            .iter()
            .enumerate()
            .filter(|(i, _)| self.choices[*i].is_none())
    }

    /// Returns the number of unresolved conflicts.
    pub fn pending_count(&self) -> usize {
        self.choices.iter().filter(|c| c.is_none()).count()
    }

    /// Returns the choice made for a conflict, if any.
    pub fn choice(&self, index: usize) -> Option<ConflictChoice> {
        self.choices.get(index).copied().flatten()
    }

    /// Returns the merged set as resolved so far.
    pub fn merged(&self) -> &[Quote] {
        &self.merged
    }

    /// Returns true once the merged set has been committed.
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Resolves one conflict.
    ///
    /// The chosen quote replaces the first merged quote carrying the
    /// conflict's server text, or is appended if there is none. Resolving
    /// the last pending conflict commits the merged set.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ConflictNotPending`] if `index` is out of range
    /// or already resolved, and any error of [`ConflictSession::commit`].
    pub fn resolve(&mut self, index: usize, choice: ConflictChoice) -> SyncResult<Resolution> {
        if self.committed {
            return Err(SyncError::AlreadyCommitted);
        }
        if !matches!(self.choices.get(index), Some(None)) {
            return Err(SyncError::ConflictNotPending { index });
        }

        let conflict = &self.conflicts[index];
        let chosen = match choice {
            ConflictChoice::KeepLocal => conflict.local.clone(),
            ConflictChoice::KeepServer => conflict.server.clone(),
        };
        match self
            .merged
            .iter()
            .position(|q| q.text == conflict.server.text)
        {
            Some(pos) => self.merged[pos] = chosen,
            None => self.merged.push(chosen),
        }
        self.choices[index] = Some(choice);
        debug!(index, %choice, "resolved conflict");

        match self.pending_count() {
            0 => self.commit().map(Resolution::Committed),
            remaining => Ok(Resolution::Pending { remaining }),
        }
    }

    /// Resolves every pending conflict with the same choice, in detection
    /// order.
    ///
    /// # Errors
    ///
    /// Returns the first error of [`ConflictSession::resolve`]; earlier
    /// resolutions are kept.
    pub fn resolve_all(&mut self, choice: ConflictChoice) -> SyncResult<Resolution> {
        let pending: Vec<usize> = self.pending().map(|(i, _)| i).collect();
        if pending.is_empty() {
            return self.commit().map(Resolution::Committed);
        }

        let mut outcome = Resolution::Pending {
            remaining: pending.len(),
        };
        for index in pending {
            outcome = self.resolve(index, choice)?;
        }
        Ok(outcome)
    }

    /// Commits the merged set once every conflict is resolved.
    ///
    /// Called automatically by the last resolution; calling it directly is
    /// only needed to retry a failed commit.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ConflictsPending`] while conflicts remain,
    /// [`SyncError::AlreadyCommitted`] after a successful commit,
    /// [`SyncError::StaleSession`] if a newer cycle has committed, or a
    /// repository error if the list cannot be persisted.
    pub fn commit(&mut self) -> SyncResult<SyncReport> {
        if self.committed {
            return Err(SyncError::AlreadyCommitted);
        }
        let pending = self.pending_count();
        if pending > 0 {
            return Err(SyncError::ConflictsPending { pending });
        }

        {
            let mut repo = self.repository.write();
            self.shared.commit(
                &mut repo,
                self.generation,
                self.merged.clone(),
                self.conflicts.len(),
            )?;
        }
        self.committed = true;

        let report = SyncReport {
            fetched: self.fetched,
            merged: self.merged.len(),
            kept_local: self.kept_local,
            conflicts_resolved: self.conflicts.len(),
            duration: self.started.elapsed(),
        };
        info!(
            quotes = report.merged,
            conflicts = report.conflicts_resolved,
            "all conflicts resolved, committed merged quotes"
        );
        Ok(report)
    }
}
