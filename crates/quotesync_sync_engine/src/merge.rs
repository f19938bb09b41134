//! Merge of local and remote quote sets.

use crate::conflict::Conflict;
use crate::transport::RemotePost;
use quotesync_core::Quote;

/// Result of merging local quotes into a remote batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeResult {
    /// Remote quotes followed by unmatched local quotes.
    pub merged: Vec<Quote>,
    /// Local/remote pairs with equal text and different category, in
    /// local order.
    pub conflicts: Vec<Conflict>,
    /// Number of local quotes carried over unchanged.
    pub kept_local: usize,
}

impl MergeResult {
    /// Returns true if the merged set can be committed as is.
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Maps remote items to quotes, keeping at most `limit` of them.
///
/// Each quote takes the item's title as text, `category` as category and
/// the item's id as server id.
pub fn quotes_from_posts(posts: Vec<RemotePost>, limit: usize, category: &str) -> Vec<Quote> {
    posts
        .into_iter()
        .take(limit)
        .map(|post| Quote::new(post.title, category).with_server_id(post.id))
        .collect()
}

/// Merges `local` into `remote`.
///
/// The merged set starts with every remote quote in remote order. Each
/// local quote is then matched against the first remote quote with the
/// same text:
///
/// - no match: the local quote is appended
/// - same category: already represented by the remote quote, dropped
/// - different category: recorded as a conflict, neither side is added
///
/// A conflicting local quote is therefore absent from `merged` until its
/// conflict is resolved.
pub fn merge_quotes(local: &[Quote], remote: &[Quote]) -> MergeResult {
    let mut result = MergeResult {
        merged: remote.to_vec(),
        ..MergeResult::default()
    };

    for quote in local {
        match remote.iter().find(|r| r.same_text(quote)) {
            None => {
                result.merged.push(quote.clone());
                result.kept_local += 1;
            }
            Some(server) if server.category == quote.category => {}
            Some(server) => result.conflicts.push(Conflict {
                local: quote.clone(),
                server: server.clone(),
            }),
        }
    }

    result
}
