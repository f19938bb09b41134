//! Quote records and category filters.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Opaque identifier assigned by the remote service.
///
/// The remote side hands out numbers, but imported files may carry
/// strings, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerId {
    /// Numeric id.
    Number(u64),
    /// Textual id.
    Text(String),
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerId::Number(n) => write!(f, "{n}"),
            ServerId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for ServerId {
    fn from(id: u64) -> Self {
        ServerId::Number(id)
    }
}

/// A single quote.
///
/// Two quotes are the same quote for merge purposes when their `text` is
/// exactly equal, whatever their category or server id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// The quote itself.
    pub text: String,
    /// Free-form category label.
    pub category: String,
    /// Remote id, present only for quotes that came from the server.
    #[serde(rename = "serverId", default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<ServerId>,
}

impl Quote {
    /// Creates a quote without a server id. No validation is applied.
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
            server_id: None,
        }
    }

    /// Creates a quote from user input, trimming both fields.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if either field is empty after
    /// trimming.
    pub fn validated(text: &str, category: &str) -> CoreResult<Self> {
        let text = text.trim();
        let category = category.trim();
        if text.is_empty() {
            return Err(CoreError::Validation { field: "text" });
        }
        if category.is_empty() {
            return Err(CoreError::Validation { field: "category" });
        }
        Ok(Self::new(text, category))
    }

    /// Attaches a server id.
    #[must_use]
    pub fn with_server_id(mut self, id: impl Into<ServerId>) -> Self {
        self.server_id = Some(id.into());
        self
    }

    /// Returns true if `other` has the same text.
    pub fn same_text(&self, other: &Quote) -> bool {
        self.text == other.text
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" ({})", self.text, self.category)
    }
}

/// Category selection applied when listing or picking quotes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Every quote.
    #[default]
    All,
    /// Quotes whose category equals this value exactly.
    Category(String),
}

impl CategoryFilter {
    const ALL: &'static str = "all";

    /// Parses a stored or user-supplied filter name; `all` selects everything.
    pub fn from_name(name: &str) -> Self {
        if name == Self::ALL {
            CategoryFilter::All
        } else {
            CategoryFilter::Category(name.to_string())
        }
    }

    /// Returns true if the quote passes this filter.
    pub fn matches(&self, quote: &Quote) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Category(c) => quote.category == *c,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str(Self::ALL),
            CategoryFilter::Category(c) => f.write_str(c),
        }
    }
}

/// Returns the built-in seed quotes used when nothing is stored.
pub fn seed_quotes() -> Vec<Quote> {
    vec![
        Quote::new(
            "The only way to do great work is to love what you do.",
            "Motivation",
        ),
        Quote::new(
            "Life is what happens when you're busy making other plans.",
            "Life",
        ),
        Quote::new(
            "In the middle of every difficulty lies opportunity.",
            "Wisdom",
        ),
        Quote::new("Simplicity is the ultimate sophistication.", "Design"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validated_trims_fields() {
        let quote = Quote::validated("  Stay hungry.  ", " Life ").unwrap();
        assert_eq!(quote.text, "Stay hungry.");
        assert_eq!(quote.category, "Life");
        assert_eq!(quote.server_id, None);
    }

    #[test]
    fn validated_rejects_blank_fields() {
        assert!(matches!(
            Quote::validated("   ", "Life"),
            Err(CoreError::Validation { field: "text" })
        ));
        assert!(matches!(
            Quote::validated("Stay hungry.", ""),
            Err(CoreError::Validation { field: "category" })
        ));
    }

    #[test]
    fn server_id_is_omitted_when_absent() {
        let json = serde_json::to_string(&Quote::new("A", "X")).unwrap();
        assert_eq!(json, r#"{"text":"A","category":"X"}"#);
    }

    #[test]
    fn server_id_uses_camel_case_key() {
        let json = serde_json::to_string(&Quote::new("A", "Server").with_server_id(7)).unwrap();
        assert_eq!(json, r#"{"text":"A","category":"Server","serverId":7}"#);
    }

    #[test]
    fn server_id_accepts_strings() {
        let quote: Quote =
            serde_json::from_str(r#"{"text":"A","category":"X","serverId":"abc"}"#).unwrap();
        assert_eq!(quote.server_id, Some(ServerId::Text("abc".into())));
    }

    #[test]
    fn same_text_ignores_category() {
        let a = Quote::new("A", "X");
        let b = Quote::new("A", "Y").with_server_id(1);
        assert!(a.same_text(&b));
        assert!(!a.same_text(&Quote::new("a", "X")));
    }

    #[test]
    fn category_filter_parsing() {
        assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "Life".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Category("Life".into())
        );
        assert_eq!(CategoryFilter::All.to_string(), "all");
    }

    #[test]
    fn category_filter_matches_exactly() {
        let quote = Quote::new("A", "Life");
        assert!(CategoryFilter::All.matches(&quote));
        assert!(CategoryFilter::Category("Life".into()).matches(&quote));
        assert!(!CategoryFilter::Category("life".into()).matches(&quote));
    }

    #[test]
    fn seed_set_has_four_distinct_categories() {
        let seeds = seed_quotes();
        assert_eq!(seeds.len(), 4);
        assert_eq!(seeds[3].category, "Design");
    }
}
