//! Sync engine state machine.

use crate::config::SyncConfig;
use crate::conflict::ConflictSession;
use crate::error::{SyncError, SyncResult};
use crate::merge::{merge_quotes, quotes_from_posts};
use crate::transport::QuoteTransport;
use parking_lot::RwLock;
use quotesync_core::{Quote, QuoteRepository};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Repository handle shared between the engine, its conflict sessions and
/// the presentation layer.
pub type SharedRepository = Arc<RwLock<QuoteRepository>>;

/// The current state of the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No cycle has run yet.
    Idle,
    /// Waiting for the remote collection.
    Fetching,
    /// The last cycle found conflicts that are not resolved yet.
    AwaitingResolution,
    /// The last cycle committed.
    Synced,
    /// The last cycle failed.
    Error,
}

impl SyncState {
    /// Returns true if a cycle is waiting on the network.
    pub fn is_active(&self) -> bool {
        matches!(self, SyncState::Fetching)
    }
}

/// Statistics about sync operations.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Cycles whose merged set was committed.
    pub cycles_completed: u64,
    /// Cycles that failed.
    pub cycles_failed: u64,
    /// Conflicts detected across all cycles.
    pub conflicts_encountered: u64,
    /// Conflicts resolved and committed.
    pub conflicts_resolved: u64,
    /// Time of the last commit.
    pub last_sync_time: Option<Instant>,
    /// Last error message.
    pub last_error: Option<String>,
}

/// Summary of a committed cycle.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Remote quotes taken into the merge.
    pub fetched: usize,
    /// Size of the committed repository.
    pub merged: usize,
    /// Local quotes carried over without a remote match.
    pub kept_local: usize,
    /// Conflicts resolved before the commit.
    pub conflicts_resolved: usize,
    /// Time from cycle start to commit.
    pub duration: Duration,
}

/// Result of one sync cycle.
#[derive(Debug)]
pub enum SyncOutcome {
    /// The merged set was committed.
    Synced(SyncReport),
    /// Conflicts were found; resolve them through the session.
    Conflicts(ConflictSession),
    /// The cycle was aborted; the repository is unchanged.
    Failed(SyncError),
}

impl SyncOutcome {
    /// Returns true for a failed cycle.
    pub fn is_failure(&self) -> bool {
        matches!(self, SyncOutcome::Failed(_))
    }
}

/// State shared by an engine and the conflict sessions it hands out.
#[derive(Debug)]
pub(crate) struct EngineShared {
    state: RwLock<SyncState>,
    stats: RwLock<SyncStats>,
    in_flight: AtomicBool,
    next_generation: AtomicU64,
    committed_generation: AtomicU64,
}

impl EngineShared {
    fn new() -> Self {
        Self {
            state: RwLock::new(SyncState::Idle),
            stats: RwLock::new(SyncStats::default()),
            in_flight: AtomicBool::new(false),
            next_generation: AtomicU64::new(0),
            committed_generation: AtomicU64::new(0),
        }
    }

    fn set_state(&self, state: SyncState) {
        *self.state.write() = state;
    }

    /// Replaces the repository contents on behalf of cycle `generation`.
    ///
    /// Callers hold the repository write lock, which serializes commits.
    pub(crate) fn commit(
        &self,
        repo: &mut QuoteRepository,
        generation: u64,
        quotes: Vec<Quote>,
        conflicts_resolved: usize,
    ) -> SyncResult<()> {
        let committed = self.committed_generation.load(Ordering::SeqCst);
        if generation <= committed {
            warn!(generation, committed, "discarding stale merge");
            return Err(SyncError::StaleSession);
        }

        repo.replace_all(quotes)?;
        self.committed_generation.store(generation, Ordering::SeqCst);
        self.set_state(SyncState::Synced);

        let mut stats = self.stats.write();
        stats.cycles_completed += 1;
        stats.conflicts_resolved += conflicts_resolved as u64;
        stats.last_sync_time = Some(Instant::now());
        stats.last_error = None;
        Ok(())
    }

    fn record_failure(&self, error: &SyncError) {
        self.set_state(SyncState::Error);
        let mut stats = self.stats.write();
        stats.cycles_failed += 1;
        stats.last_error = Some(error.to_string());
    }
}

/// Clears the in-flight flag when a cycle ends, including when its future
/// is dropped mid-fetch.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The sync engine reconciles a quote repository with a remote collection.
pub struct SyncEngine<T: QuoteTransport> {
    config: SyncConfig,
    transport: Arc<T>,
    repository: SharedRepository,
    shared: Arc<EngineShared>,
}

impl<T: QuoteTransport> SyncEngine<T> {
    /// Creates a new sync engine.
    pub fn new(config: SyncConfig, transport: T, repository: SharedRepository) -> Self {
        Self {
            config,
            transport: Arc::new(transport),
            repository,
            shared: Arc::new(EngineShared::new()),
        }
    }

    /// Gets the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Gets the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Gets the shared repository.
    pub fn repository(&self) -> &SharedRepository {
        &self.repository
    }

    /// Gets the current state.
    pub fn state(&self) -> SyncState {
        *self.shared.state.read()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.shared.stats.read().clone()
    }

    /// Returns true while a cycle is running.
    pub fn is_in_flight(&self) -> bool {
        self.shared.in_flight.load(Ordering::SeqCst)
    }

    /// Runs one sync cycle.
    ///
    /// Never fails past its boundary: every error becomes
    /// [`SyncOutcome::Failed`] and leaves the repository unchanged. A call
    /// made while another cycle is in flight fails with
    /// [`SyncError::AlreadyInFlight`].
    pub async fn run_sync(&self) -> SyncOutcome {
        let start = Instant::now();
        let Some(_guard) = InFlightGuard::acquire(&self.shared.in_flight) else {
            debug!("sync requested while another cycle is in flight");
            return SyncOutcome::Failed(SyncError::AlreadyInFlight);
        };

        let generation = self.shared.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.set_state(SyncState::Fetching);
        debug!(generation, url = %self.config.server_url, "sync cycle started");

        match self.fetch_remote().await {
            Ok(remote) => self.apply_remote(generation, remote, start),
            Err(e) => {
                warn!(error = %e, "sync cycle failed");
                self.shared.record_failure(&e);
                SyncOutcome::Failed(e)
            }
        }
    }

    /// Validates a user quote, submits it to the remote and, once accepted,
    /// appends it to the repository.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty fields, a transport error if
    /// the remote rejects or cannot be reached, or a repository error if
    /// the list cannot be persisted. The repository is unchanged on error.
    pub async fn publish(&self, text: &str, category: &str) -> SyncResult<Quote> {
        let quote = Quote::validated(text, category)?;

        match tokio::time::timeout(self.config.timeout, self.transport.submit_quote(&quote)).await
        {
            Ok(result) => result?,
            Err(_) => return Err(SyncError::Timeout),
        }

        self.repository.write().push(quote.clone())?;
        info!(text = %quote.text, category = %quote.category, "published quote");
        Ok(quote)
    }

    async fn fetch_remote(&self) -> SyncResult<Vec<Quote>> {
        let fetch = self.transport.fetch_posts(self.config.batch_limit);
        let posts = tokio::time::timeout(self.config.timeout, fetch)
            .await
            .map_err(|_| SyncError::Timeout)??;

        Ok(quotes_from_posts(
            posts,
            self.config.batch_limit,
            &self.config.remote_category,
        ))
    }

    fn apply_remote(&self, generation: u64, remote: Vec<Quote>, start: Instant) -> SyncOutcome {
        let fetched = remote.len();
        let mut repo = self.repository.write();
        let merge = merge_quotes(repo.quotes(), &remote);
        debug!(
            fetched,
            kept_local = merge.kept_local,
            conflicts = merge.conflicts.len(),
            "merged remote quotes"
        );

        if merge.is_clean() {
            let merged = merge.merged.len();
            if let Err(e) = self.shared.commit(&mut repo, generation, merge.merged, 0) {
                warn!(error = %e, "committing merged quotes failed");
                self.shared.record_failure(&e);
                return SyncOutcome::Failed(e);
            }
            info!(quotes = merged, "quotes synced with server");
            return SyncOutcome::Synced(SyncReport {
                fetched,
                merged,
                kept_local: merge.kept_local,
                conflicts_resolved: 0,
                duration: start.elapsed(),
            });
        }
        drop(repo);

        info!(conflicts = merge.conflicts.len(), "sync found conflicts");
        self.shared.set_state(SyncState::AwaitingResolution);
        self.shared.stats.write().conflicts_encountered += merge.conflicts.len() as u64;

        SyncOutcome::Conflicts(ConflictSession::new(
            generation,
            merge.conflicts,
            merge.merged,
            fetched,
            merge.kept_local,
            start,
            Arc::clone(&self.repository),
            Arc::clone(&self.shared),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::{ConflictChoice, Resolution};
    use crate::transport::{MockTransport, RemotePost};
    use quotesync_storage::{InMemoryStore, KeyValueStore};

    fn repository_with(quotes: &[Quote]) -> (SharedRepository, Arc<InMemoryStore>) {
        let durable = Arc::new(InMemoryStore::with_entries([(
            "quotes_v1",
            serde_json::to_string(quotes).unwrap(),
        )]));
        let repo = QuoteRepository::open(durable.clone(), Arc::new(InMemoryStore::new())).unwrap();
        (Arc::new(RwLock::new(repo)), durable)
    }

    fn engine_with(
        local: &[Quote],
        posts: Vec<RemotePost>,
    ) -> (SyncEngine<MockTransport>, Arc<InMemoryStore>) {
        let (repo, durable) = repository_with(local);
        let engine = SyncEngine::new(
            SyncConfig::default(),
            MockTransport::with_posts(posts),
            repo,
        );
        (engine, durable)
    }

    fn stored(durable: &InMemoryStore) -> Vec<Quote> {
        serde_json::from_str(&durable.get("quotes_v1").unwrap().unwrap()).unwrap()
    }

    fn server(text: &str, id: u64) -> Quote {
        Quote::new(text, "Server").with_server_id(id)
    }

    #[test]
    fn sync_state_checks() {
        assert!(SyncState::Fetching.is_active());
        assert!(!SyncState::AwaitingResolution.is_active());
        assert!(!SyncState::Idle.is_active());
    }

    #[tokio::test]
    async fn sync_engine_initial_state() {
        let (engine, _) = engine_with(&[], vec![]);
        assert_eq!(engine.state(), SyncState::Idle);
        assert_eq!(engine.stats().cycles_completed, 0);
        assert!(!engine.is_in_flight());
    }

    #[tokio::test]
    async fn clean_sync_commits_and_persists() {
        let (engine, durable) =
            engine_with(&[Quote::new("B", "Z")], vec![RemotePost::new(1, "A")]);

        let SyncOutcome::Synced(report) = engine.run_sync().await else {
            panic!("expected a clean sync");
        };
        assert_eq!(report.fetched, 1);
        assert_eq!(report.merged, 2);
        assert_eq!(report.kept_local, 1);

        let expected = vec![server("A", 1), Quote::new("B", "Z")];
        assert_eq!(engine.repository().read().quotes(), expected.as_slice());
        assert_eq!(stored(&durable), expected);
        assert_eq!(engine.state(), SyncState::Synced);
        assert_eq!(engine.stats().cycles_completed, 1);
    }

    #[tokio::test]
    async fn remote_batch_is_capped() {
        let posts = (1..=10u64).map(|i| RemotePost::new(i, format!("t{i}"))).collect();
        let (engine, _) = engine_with(&[], posts);

        let SyncOutcome::Synced(report) = engine.run_sync().await else {
            panic!("expected a clean sync");
        };
        assert_eq!(report.fetched, 5);
        assert_eq!(engine.repository().read().len(), 5);
    }

    #[tokio::test]
    async fn failed_fetch_leaves_repository_unchanged() {
        let local = vec![Quote::new("B", "Z")];
        let (engine, durable) = engine_with(&local, vec![RemotePost::new(1, "A")]);
        engine.transport().set_failure(Some("offline"));

        let outcome = engine.run_sync().await;
        assert!(matches!(outcome, SyncOutcome::Failed(SyncError::Transport { .. })));
        assert_eq!(engine.repository().read().quotes(), local.as_slice());
        assert_eq!(stored(&durable), local);
        assert_eq!(engine.state(), SyncState::Error);
        assert!(engine.stats().last_error.is_some());
        assert!(!engine.is_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_times_out() {
        let (repo, _) = repository_with(&[]);
        let transport = MockTransport::new();
        transport.set_delay(Some(Duration::from_secs(60)));
        let engine = SyncEngine::new(
            SyncConfig::default().with_timeout(Duration::from_secs(1)),
            transport,
            repo,
        );

        let outcome = engine.run_sync().await;
        assert!(matches!(outcome, SyncOutcome::Failed(SyncError::Timeout)));
    }

    #[tokio::test]
    async fn conflict_resolved_with_server() {
        let (engine, durable) =
            engine_with(&[Quote::new("A", "X")], vec![RemotePost::new(1, "A")]);

        let SyncOutcome::Conflicts(mut session) = engine.run_sync().await else {
            panic!("expected conflicts");
        };
        assert_eq!(session.conflicts().len(), 1);
        assert_eq!(session.conflicts()[0].local, Quote::new("A", "X"));
        assert_eq!(session.conflicts()[0].server, server("A", 1));
        assert_eq!(engine.state(), SyncState::AwaitingResolution);

        // Nothing committed while the conflict is pending.
        assert_eq!(stored(&durable), vec![Quote::new("A", "X")]);

        let resolution = session.resolve(0, ConflictChoice::KeepServer).unwrap();
        assert!(matches!(resolution, Resolution::Committed(_)));
        assert_eq!(stored(&durable), vec![server("A", 1)]);
        assert_eq!(engine.state(), SyncState::Synced);
        assert_eq!(engine.stats().conflicts_resolved, 1);
    }

    #[tokio::test]
    async fn conflict_resolved_with_local() {
        let (engine, durable) =
            engine_with(&[Quote::new("A", "X")], vec![RemotePost::new(1, "A")]);

        let SyncOutcome::Conflicts(mut session) = engine.run_sync().await else {
            panic!("expected conflicts");
        };
        session.resolve(0, ConflictChoice::KeepLocal).unwrap();
        assert_eq!(stored(&durable), vec![Quote::new("A", "X")]);
        assert!(session.is_committed());
    }

    #[tokio::test]
    async fn partial_resolution_does_not_commit() {
        let local = vec![Quote::new("A", "X"), Quote::new("B", "Y")];
        let (engine, durable) = engine_with(
            &local,
            vec![RemotePost::new(1, "A"), RemotePost::new(2, "B")],
        );

        let SyncOutcome::Conflicts(mut session) = engine.run_sync().await else {
            panic!("expected conflicts");
        };
        let resolution = session.resolve(1, ConflictChoice::KeepLocal).unwrap();
        assert!(matches!(resolution, Resolution::Pending { remaining: 1 }));
        assert_eq!(stored(&durable), local);

        assert!(matches!(
            session.resolve(1, ConflictChoice::KeepServer),
            Err(SyncError::ConflictNotPending { index: 1 })
        ));
        assert!(matches!(
            session.resolve(7, ConflictChoice::KeepServer),
            Err(SyncError::ConflictNotPending { index: 7 })
        ));
        assert!(matches!(
            session.commit(),
            Err(SyncError::ConflictsPending { pending: 1 })
        ));

        session.resolve(0, ConflictChoice::KeepServer).unwrap();
        assert_eq!(stored(&durable), vec![server("A", 1), Quote::new("B", "Y")]);
    }

    #[tokio::test]
    async fn resolve_all_keeps_local_categories() {
        let local = vec![
            Quote::new("A", "X"),
            Quote::new("C", "Kept"),
            Quote::new("B", "Y"),
        ];
        let (engine, durable) = engine_with(
            &local,
            vec![RemotePost::new(1, "A"), RemotePost::new(2, "B")],
        );

        let SyncOutcome::Conflicts(mut session) = engine.run_sync().await else {
            panic!("expected conflicts");
        };
        assert_eq!(session.pending_count(), 2);
        session.resolve_all(ConflictChoice::KeepLocal).unwrap();

        assert_eq!(
            stored(&durable),
            vec![
                Quote::new("A", "X"),
                Quote::new("B", "Y"),
                Quote::new("C", "Kept"),
            ]
        );
        assert!(matches!(
            session.resolve_all(ConflictChoice::KeepServer),
            Err(SyncError::AlreadyCommitted)
        ));
    }

    #[tokio::test]
    async fn newer_cycle_makes_pending_session_stale() {
        let (engine, durable) =
            engine_with(&[Quote::new("A", "X")], vec![RemotePost::new(1, "A")]);

        let SyncOutcome::Conflicts(mut stale) = engine.run_sync().await else {
            panic!("expected conflicts");
        };

        // The remote changes so the next cycle is clean and commits.
        engine.transport().set_posts(vec![RemotePost::new(2, "Z")]);
        assert!(matches!(engine.run_sync().await, SyncOutcome::Synced(_)));
        let committed = stored(&durable);

        let result = stale.resolve(0, ConflictChoice::KeepServer);
        assert!(matches!(result, Err(SyncError::StaleSession)));
        assert_eq!(stored(&durable), committed);
    }

    #[tokio::test]
    async fn repeated_sync_is_idempotent() {
        let (engine, _) = engine_with(
            &[Quote::new("B", "Z")],
            vec![RemotePost::new(1, "A"), RemotePost::new(2, "C")],
        );

        assert!(matches!(engine.run_sync().await, SyncOutcome::Synced(_)));
        let first = engine.repository().read().snapshot();
        assert!(matches!(engine.run_sync().await, SyncOutcome::Synced(_)));
        let second = engine.repository().read().snapshot();
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_sync_is_rejected() {
        let (engine, _) = engine_with(&[], vec![RemotePost::new(1, "A")]);
        engine.transport().set_delay(Some(Duration::from_secs(5)));
        let engine = Arc::new(engine);

        let first = tokio::spawn({
            let engine = Arc::clone(&engine);
            async move { engine.run_sync().await }
        });
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(engine.is_in_flight());
        assert_eq!(engine.state(), SyncState::Fetching);

        let second = engine.run_sync().await;
        assert!(matches!(second, SyncOutcome::Failed(SyncError::AlreadyInFlight)));

        assert!(matches!(first.await.unwrap(), SyncOutcome::Synced(_)));
        assert!(!engine.is_in_flight());
        assert_eq!(engine.transport().fetch_count(), 1);
    }

    #[tokio::test]
    async fn publish_appends_after_remote_accepts() {
        let (engine, durable) = engine_with(&[], vec![]);

        let quote = engine.publish("  Less is more. ", "Design").await.unwrap();
        assert_eq!(quote, Quote::new("Less is more.", "Design"));
        assert_eq!(engine.transport().submitted(), vec![quote.clone()]);
        assert_eq!(stored(&durable), vec![quote]);
    }

    #[tokio::test]
    async fn publish_failure_leaves_repository_unchanged() {
        let (engine, durable) = engine_with(&[], vec![]);
        engine.transport().set_failure(Some("offline"));

        assert!(engine.publish("Less is more.", "Design").await.is_err());
        assert!(stored(&durable).is_empty());

        assert!(matches!(
            engine.publish("", "Design").await,
            Err(SyncError::Core(_))
        ));
    }
}
