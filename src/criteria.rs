//! Typed IMAP search criteria
//!
//! Provides strongly-typed search terms instead of raw query
//! strings. Terms are combined with implicit AND semantics by the
//! server, in the order they were added.

use chrono::NaiveDate;
use std::fmt;

/// A single IMAP SEARCH predicate.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use mailgrab::SearchTerm;
///
/// let since = SearchTerm::Since(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
/// assert_eq!(since.to_string(), "SINCE 5-Jan-2024");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTerm {
    /// Every message in the mailbox.
    All,
    /// Messages without the `\Seen` flag.
    Unseen,
    /// Messages with the `\Seen` flag.
    Seen,
    /// Messages with an internal date on or after the given day
    /// (IMAP SINCE is inclusive).
    Since(NaiveDate),
    /// Messages with an internal date strictly before the given day.
    Before(NaiveDate),
    /// Messages whose Subject header contains the given text
    /// (case-insensitive substring match, per RFC 3501).
    Subject(String),
    /// Messages where an arbitrary header contains the given text.
    Header(String, String),
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("ALL"),
            Self::Unseen => f.write_str("UNSEEN"),
            Self::Seen => f.write_str("SEEN"),
            Self::Since(date) => write!(f, "SINCE {}", date.format("%-d-%b-%Y")),
            Self::Before(date) => write!(f, "BEFORE {}", date.format("%-d-%b-%Y")),
            Self::Subject(text) => write!(f, "HEADER SUBJECT {}", quote(text)),
            Self::Header(name, text) => {
                write!(f, "HEADER {} {}", name.to_uppercase(), quote(text))
            }
        }
    }
}

/// An ordered sequence of search terms, ANDed by the server.
///
/// An empty criteria list renders as `ALL`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    terms: Vec<SearchTerm>,
}

impl SearchCriteria {
    #[must_use]
    pub const fn new() -> Self {
        Self { terms: Vec::new() }
    }

    /// Append a term, preserving insertion order.
    #[must_use]
    pub fn with(mut self, term: SearchTerm) -> Self {
        self.terms.push(term);
        self
    }

    pub fn push(&mut self, term: SearchTerm) {
        self.terms.push(term);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl fmt::Display for SearchCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("ALL");
        }
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{term}")?;
        }
        Ok(())
    }
}

impl FromIterator<SearchTerm> for SearchCriteria {
    fn from_iter<I: IntoIterator<Item = SearchTerm>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().collect(),
        }
    }
}

/// Quote a search value as an IMAP quoted string.
fn quote(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}
