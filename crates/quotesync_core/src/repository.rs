//! The quote repository.

use crate::config::RepositoryConfig;
use crate::error::{CoreError, CoreResult};
use crate::quote::{seed_quotes, CategoryFilter, Quote};
use quotesync_storage::KeyValueStore;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, warn};

/// Ordered, persisted list of quotes.
///
/// The repository is the source of truth during a session. Quotes are kept
/// in insertion order and duplicates are allowed. The list lives in a
/// durable store; the last viewed quote lives in a session store.
///
/// Every mutating method writes the new list back before returning. If the
/// write fails the in-memory list is restored, so a failed call leaves the
/// repository unchanged.
pub struct QuoteRepository {
    config: RepositoryConfig,
    durable: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
    quotes: Vec<Quote>,
}

impl std::fmt::Debug for QuoteRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteRepository")
            .field("config", &self.config)
            .field("quotes", &self.quotes)
            .finish_non_exhaustive()
    }
}

impl QuoteRepository {
    /// Opens the repository with the default storage keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the stores cannot be read, or if the seed set
    /// cannot be written into an empty durable store.
    pub fn open(
        durable: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
    ) -> CoreResult<Self> {
        Self::open_with_config(RepositoryConfig::default(), durable, session)
    }

    /// Opens the repository with explicit storage keys.
    ///
    /// When no quote list is stored, the seed set is loaded and persisted.
    /// When the stored list cannot be parsed, the seed set is loaded but the
    /// stored value is left as it is.
    ///
    /// # Errors
    ///
    /// Returns an error if the stores cannot be read or written.
    pub fn open_with_config(
        config: RepositoryConfig,
        durable: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
    ) -> CoreResult<Self> {
        let stored = durable
            .get(&config.quotes_key)?
            .filter(|raw| !raw.is_empty());

        let mut repo = Self {
            config,
            durable,
            session,
            quotes: Vec::new(),
        };

        match stored {
            Some(raw) => match serde_json::from_str::<Vec<Quote>>(&raw) {
                Ok(quotes) => {
                    debug!(count = quotes.len(), "loaded stored quotes");
                    repo.quotes = quotes;
                }
                Err(e) => {
                    warn!(error = %e, "stored quotes are unreadable, using seed set");
                    repo.quotes = seed_quotes();
                }
            },
            None => {
                debug!("no stored quotes, persisting seed set");
                repo.quotes = seed_quotes();
                repo.save()?;
            }
        }

        Ok(repo)
    }

    /// Returns the quotes in order.
    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    /// Returns a copy of the current quotes.
    pub fn snapshot(&self) -> Vec<Quote> {
        self.quotes.clone()
    }

    /// Returns the number of quotes.
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Returns true if the repository holds no quotes.
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Returns the storage keys in use.
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Writes the quote list to the durable store.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the store write fails.
    pub fn save(&self) -> CoreResult<()> {
        let encoded = serde_json::to_string(&self.quotes)?;
        self.durable.set(&self.config.quotes_key, &encoded)?;
        Ok(())
    }

    /// Validates and appends a user quote.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for empty fields, or a storage
    /// error if the list cannot be persisted.
    pub fn add(&mut self, text: &str, category: &str) -> CoreResult<&Quote> {
        let quote = Quote::validated(text, category)?;
        self.push(quote)?;
        Ok(&self.quotes[self.quotes.len() - 1])
    }

    /// Appends an already built quote.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be persisted.
    pub fn push(&mut self, quote: Quote) -> CoreResult<()> {
        self.quotes.push(quote);
        if let Err(e) = self.save() {
            self.quotes.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Replaces the whole list and persists it.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be persisted.
    pub fn replace_all(&mut self, quotes: Vec<Quote>) -> CoreResult<()> {
        let previous = std::mem::replace(&mut self.quotes, quotes);
        if let Err(e) = self.save() {
            self.quotes = previous;
            return Err(e);
        }
        debug!(count = self.quotes.len(), "replaced quote list");
        Ok(())
    }

    /// Returns the distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for quote in &self.quotes {
            if !seen.iter().any(|c| *c == quote.category) {
                seen.push(quote.category.clone());
            }
        }
        seen
    }

    /// Returns the quotes passing `filter`, in order.
    pub fn filter(&self, filter: &CategoryFilter) -> Vec<&Quote> {
        self.quotes.iter().filter(|q| filter.matches(q)).collect()
    }

    /// Picks a random quote passing `filter` and records it as last viewed.
    ///
    /// Returns `None` when no quote passes the filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be written.
    pub fn random_quote<R: Rng + ?Sized>(
        &self,
        filter: &CategoryFilter,
        rng: &mut R,
    ) -> CoreResult<Option<Quote>> {
        let candidates = self.filter(filter);
        let Some(picked) = candidates.choose(rng) else {
            return Ok(None);
        };

        let viewed = Quote::new(picked.text.clone(), picked.category.clone());
        self.session
            .set(&self.config.last_viewed_key, &serde_json::to_string(&viewed)?)?;
        Ok(Some((*picked).clone()))
    }

    /// Returns the last viewed quote of this session, if any.
    ///
    /// An unreadable stored value is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub fn last_viewed(&self) -> CoreResult<Option<Quote>> {
        let Some(raw) = self.session.get(&self.config.last_viewed_key)? else {
            return Ok(None);
        };
        Ok(serde_json::from_str(&raw).ok())
    }

    /// Persists the selected filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable store cannot be written.
    pub fn set_last_filter(&self, filter: &CategoryFilter) -> CoreResult<()> {
        self.durable
            .set(&self.config.last_filter_key, &filter.to_string())?;
        Ok(())
    }

    /// Returns the persisted filter if it is still applicable.
    ///
    /// A stored category that no quote carries any more is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable store cannot be read.
    pub fn last_filter(&self) -> CoreResult<Option<CategoryFilter>> {
        let Some(raw) = self.durable.get(&self.config.last_filter_key)? else {
            return Ok(None);
        };
        let filter = CategoryFilter::from_name(&raw);
        let applicable = match &filter {
            CategoryFilter::All => true,
            CategoryFilter::Category(c) => self.quotes.iter().any(|q| q.category == *c),
        };
        Ok(applicable.then_some(filter))
    }

    /// Renders the list as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn export_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(&self.quotes)?)
    }

    /// Appends every quote of a JSON array, without de-duplication.
    ///
    /// Returns the number of quotes appended.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidImport`] if `raw` is not a JSON array of
    /// quote records, or a storage error if the list cannot be persisted.
    /// The repository is unchanged on error.
    pub fn import_json(&mut self, raw: &str) -> CoreResult<usize> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| CoreError::InvalidImport(e.to_string()))?;
        if !value.is_array() {
            return Err(CoreError::InvalidImport("expected a JSON array".into()));
        }
        let imported: Vec<Quote> =
            serde_json::from_value(value).map_err(|e| CoreError::InvalidImport(e.to_string()))?;

        let count = imported.len();
        let previous_len = self.quotes.len();
        self.quotes.extend(imported);
        if let Err(e) = self.save() {
            self.quotes.truncate(previous_len);
            return Err(e);
        }

        debug!(count, "imported quotes");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotesync_storage::InMemoryStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn open_empty() -> (QuoteRepository, Arc<InMemoryStore>, Arc<InMemoryStore>) {
        let durable = Arc::new(InMemoryStore::new());
        let session = Arc::new(InMemoryStore::new());
        let repo = QuoteRepository::open(durable.clone(), session.clone()).unwrap();
        (repo, durable, session)
    }

    fn open_with(quotes: &[Quote]) -> (QuoteRepository, Arc<InMemoryStore>) {
        let durable = Arc::new(InMemoryStore::with_entries([(
            "quotes_v1",
            serde_json::to_string(quotes).unwrap(),
        )]));
        let session = Arc::new(InMemoryStore::new());
        let repo = QuoteRepository::open(durable.clone(), session).unwrap();
        (repo, durable)
    }

    #[test]
    fn open_seeds_and_persists_when_absent() {
        let (repo, durable, _) = open_empty();
        assert_eq!(repo.quotes(), seed_quotes().as_slice());

        let stored = durable.get("quotes_v1").unwrap().unwrap();
        let stored: Vec<Quote> = serde_json::from_str(&stored).unwrap();
        assert_eq!(stored, seed_quotes());
    }

    #[test]
    fn open_falls_back_to_seed_on_corruption() {
        let durable = Arc::new(InMemoryStore::with_entries([("quotes_v1", "{not json")]));
        let repo =
            QuoteRepository::open(durable.clone(), Arc::new(InMemoryStore::new())).unwrap();

        assert_eq!(repo.quotes(), seed_quotes().as_slice());
        // The unreadable value is left in place.
        assert_eq!(durable.get("quotes_v1").unwrap().as_deref(), Some("{not json"));
    }

    #[test]
    fn open_loads_stored_quotes() {
        let (repo, _) = open_with(&[Quote::new("A", "X"), Quote::new("A", "X")]);
        assert_eq!(repo.len(), 2);
    }

    #[test]
    fn add_validates_and_persists() {
        let (mut repo, durable, _) = open_empty();
        let added = repo.add(" Stay hungry. ", " Life ").unwrap().clone();
        assert_eq!(added, Quote::new("Stay hungry.", "Life"));
        assert_eq!(repo.len(), 5);

        let stored: Vec<Quote> =
            serde_json::from_str(&durable.get("quotes_v1").unwrap().unwrap()).unwrap();
        assert_eq!(stored.last(), Some(&added));
    }

    #[test]
    fn add_rejects_empty_without_state_change() {
        let (mut repo, _, _) = open_empty();
        assert!(matches!(
            repo.add("", "Life"),
            Err(CoreError::Validation { .. })
        ));
        assert_eq!(repo.len(), 4);
    }

    #[test]
    fn categories_in_first_seen_order() {
        let (repo, _) = open_with(&[
            Quote::new("1", "B"),
            Quote::new("2", "A"),
            Quote::new("3", "B"),
        ]);
        assert_eq!(repo.categories(), vec!["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn filter_by_category() {
        let (repo, _) = open_with(&[
            Quote::new("1", "B"),
            Quote::new("2", "A"),
            Quote::new("3", "B"),
        ]);
        let picked = repo.filter(&CategoryFilter::Category("B".into()));
        assert_eq!(picked.len(), 2);
        assert_eq!(repo.filter(&CategoryFilter::All).len(), 3);
    }

    #[test]
    fn random_quote_records_last_viewed() {
        let (repo, _, session) = open_empty();
        let mut rng = StdRng::seed_from_u64(7);

        let picked = repo
            .random_quote(&CategoryFilter::Category("Life".into()), &mut rng)
            .unwrap()
            .unwrap();
        assert_eq!(picked.category, "Life");
        assert!(session.get("lastViewedQuote").unwrap().is_some());
        assert_eq!(repo.last_viewed().unwrap(), Some(picked));
    }

    #[test]
    fn random_quote_empty_filter_returns_none() {
        let (repo, _, session) = open_empty();
        let mut rng = StdRng::seed_from_u64(7);

        let picked = repo
            .random_quote(&CategoryFilter::Category("Nope".into()), &mut rng)
            .unwrap();
        assert!(picked.is_none());
        assert!(session.is_empty());
    }

    #[test]
    fn last_filter_ignores_vanished_category() {
        let (repo, _, _) = open_empty();
        assert_eq!(repo.last_filter().unwrap(), None);

        repo.set_last_filter(&CategoryFilter::Category("Life".into()))
            .unwrap();
        assert_eq!(
            repo.last_filter().unwrap(),
            Some(CategoryFilter::Category("Life".into()))
        );

        repo.set_last_filter(&CategoryFilter::Category("Gone".into()))
            .unwrap();
        assert_eq!(repo.last_filter().unwrap(), None);

        repo.set_last_filter(&CategoryFilter::All).unwrap();
        assert_eq!(repo.last_filter().unwrap(), Some(CategoryFilter::All));
    }

    #[test]
    fn import_appends_without_dedup() {
        let (mut repo, _) = open_with(&[Quote::new("A", "X")]);
        let count = repo
            .import_json(r#"[{"text":"A","category":"X"},{"text":"B","category":"Y"}]"#)
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(repo.len(), 3);
    }

    #[test]
    fn import_rejects_non_array() {
        let (mut repo, _) = open_with(&[Quote::new("A", "X")]);
        let result = repo.import_json(r#"{"text":"A","category":"X"}"#);
        assert!(matches!(result, Err(CoreError::InvalidImport(_))));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn import_rejects_invalid_json() {
        let (mut repo, _) = open_with(&[]);
        assert!(matches!(
            repo.import_json("[{"),
            Err(CoreError::InvalidImport(_))
        ));
        assert!(repo.is_empty());
    }

    #[test]
    fn export_is_pretty_printed() {
        let (repo, _) = open_with(&[Quote::new("A", "X")]);
        let exported = repo.export_json().unwrap();
        assert!(exported.contains('\n'));
        assert!(exported.contains("\"text\": \"A\""));
    }

    #[test]
    fn replace_all_persists() {
        let (mut repo, durable) = open_with(&[Quote::new("A", "X")]);
        repo.replace_all(vec![Quote::new("B", "Y")]).unwrap();

        let stored: Vec<Quote> =
            serde_json::from_str(&durable.get("quotes_v1").unwrap().unwrap()).unwrap();
        assert_eq!(stored, vec![Quote::new("B", "Y")]);
    }
}
