//! Core types shared across the archive: article identifiers, group state
//! and the raw article payload held by the cache.

use serde::{Deserialize, Serialize};

/// NNTP article number within the selected group
///
/// Protocol-assigned, monotonically increasing within a group but not
/// necessarily contiguous (expired articles leave holes).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ArticleId(u64);

impl ArticleId {
    /// Create an article ID from a raw article number
    /// Marked const fn to allow compile-time evaluation
    #[must_use]
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying article number
    #[must_use]
    #[inline]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ArticleId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ArticleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ArticleId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}

/// Group state as reported by a `211` response to GROUP
///
/// Per [RFC 3977 Section 6.1.1](https://datatracker.ietf.org/doc/html/rfc3977#section-6.1.1):
/// `211 number low high group`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupStatus {
    /// Estimated number of articles in the group
    pub count: u64,
    /// Lowest article number in the group
    pub low: ArticleId,
    /// Highest article number in the group (the archive high-water mark)
    pub high: ArticleId,
    /// Group name as echoed by the server
    pub name: String,
}

/// Raw article payload: the ordered byte lines of one message as returned
/// by the protocol layer, without CRLF terminators and with dot-stuffing
/// already undone.
///
/// Immutable once fetched. Owned by the cache entry that holds it; callers
/// get `Arc<RawArticle>` handles. Serializable so the cache can be persisted
/// across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawArticle {
    lines: Vec<Vec<u8>>,
}

impl RawArticle {
    /// Wrap protocol lines into a raw article
    #[must_use]
    pub fn new(lines: Vec<Vec<u8>>) -> Self {
        Self { lines }
    }

    /// Borrow the raw byte lines
    #[must_use]
    pub fn lines(&self) -> &[Vec<u8>] {
        &self.lines
    }

    /// Number of lines in the article
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Join the lines into a single blob for MIME parsing
    ///
    /// Lines are 7-bit-clean protocol text; a plain `\n` between lines is
    /// all the mail parser needs. The separator goes between lines, not
    /// after the last one, so a single-line body decodes without a trailing
    /// newline the wire never carried.
    #[must_use]
    pub fn as_bytes(&self) -> Vec<u8> {
        let total: usize = self.lines.iter().map(|l| l.len() + 1).sum();
        let mut blob = Vec::with_capacity(total);
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                blob.push(b'\n');
            }
            blob.extend_from_slice(line);
        }
        blob
    }
}

impl From<&str> for RawArticle {
    /// Convenience for building articles from text (used heavily in tests)
    fn from(text: &str) -> Self {
        Self::new(text.lines().map(|l| l.as_bytes().to_vec()).collect())
    }
}
