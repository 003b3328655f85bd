//! Bounded article cache with insertion-order eviction
//!
//! The cache sits in front of the NNTP session: a hit costs nothing, a miss
//! costs exactly one ARTICLE round-trip. Eviction is strict FIFO by insertion
//! time, never by access recency - an article that is read constantly still
//! ages out once enough newer articles have been fetched. This is an
//! insertion-order cache, not an LRU cache, and the distinction is load
//! bearing for an append-only archive where recent ids dominate traffic.
//!
//! The whole mapping can be persisted at session close and reloaded at open;
//! in between, the store is purely in-memory.

use std::collections::{HashMap, VecDeque};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::ArchiveError;
use crate::session::NewsSession;
use crate::types::{ArticleId, RawArticle};

/// On-disk form: insertion-ordered list of (id, article) pairs
type PersistedEntries = Vec<(ArticleId, RawArticle)>;

/// Bounded FIFO article cache
#[derive(Debug)]
pub struct ArticleCache {
    entries: HashMap<ArticleId, Arc<RawArticle>>,
    /// Ids in insertion order; front is the eviction candidate
    order: VecDeque<ArticleId>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl ArticleCache {
    /// Create an empty cache holding at most `capacity` articles
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
            hits: 0,
            misses: 0,
        }
    }

    /// Return the cached article, fetching and inserting it on a miss
    ///
    /// A miss performs exactly one `fetch_article` round-trip. If the fetch
    /// fails nothing is inserted and the cache is left untouched. After an
    /// insertion, oldest-inserted entries are evicted until the size is back
    /// within capacity.
    pub async fn get_or_fetch<S: NewsSession>(
        &mut self,
        id: ArticleId,
        session: &mut S,
    ) -> Result<Arc<RawArticle>, ArchiveError> {
        if let Some(article) = self.entries.get(&id) {
            self.hits += 1;
            debug!("Cache hit for article {}", id);
            return Ok(Arc::clone(article));
        }

        self.misses += 1;
        let article = Arc::new(session.fetch_article(id).await?);
        self.insert(id, Arc::clone(&article));
        Ok(article)
    }

    /// Insert an article as the newest entry, then enforce capacity
    ///
    /// Re-inserting an existing id replaces the payload but keeps the entry's
    /// original position in the eviction order.
    pub fn insert(&mut self, id: ArticleId, article: Arc<RawArticle>) {
        if self.entries.insert(id, article).is_none() {
            self.order.push_back(id);
        }
        while self.entries.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
                debug!("Evicted article {} from cache", oldest);
            } else {
                break;
            }
        }
    }

    /// Check whether an article is currently cached
    #[must_use]
    pub fn contains(&self, id: ArticleId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Current number of cached articles
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of articles, fixed at construction
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of lookups served from memory
    #[must_use]
    pub const fn hits(&self) -> u64 {
        self.hits
    }

    /// Number of lookups that required a network fetch
    #[must_use]
    pub const fn misses(&self) -> u64 {
        self.misses
    }

    /// Load a cache from a persistence file
    ///
    /// A missing file yields an empty cache. An unreadable or corrupt file
    /// also yields an empty cache, with a warning - a broken cache file must
    /// never prevent the archive from opening. Entries beyond `capacity`
    /// are dropped oldest-first so the invariant holds from the start.
    #[must_use]
    pub fn load(path: &Path, capacity: usize) -> Self {
        let mut cache = Self::new(capacity);

        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No cache file at {}, starting empty", path.display());
                return cache;
            }
            Err(e) => {
                warn!(
                    "Failed to read cache file {}: {}, starting empty",
                    path.display(),
                    e
                );
                return cache;
            }
        };

        let persisted: PersistedEntries = match serde_json::from_slice(&data) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Cache file {} is corrupt: {}, starting empty",
                    path.display(),
                    e
                );
                return cache;
            }
        };

        let count = persisted.len();
        for (id, article) in persisted {
            cache.insert(id, Arc::new(article));
        }
        info!("Loaded {} articles from cache file {}", count, path.display());
        cache
    }

    /// Persist the full ordered mapping to a file
    pub fn save(&self, path: &Path) -> Result<(), ArchiveError> {
        let persisted: Vec<(ArticleId, &RawArticle)> = self
            .order
            .iter()
            .filter_map(|id| self.entries.get(id).map(|a| (*id, a.as_ref())))
            .collect();

        let data = serde_json::to_vec(&persisted).map_err(|e| ArchiveError::CachePersist {
            path: path.to_path_buf(),
            source: std::io::Error::other(e),
        })?;

        std::fs::write(path, data).map_err(|source| ArchiveError::CachePersist {
            path: path.to_path_buf(),
            source,
        })?;

        info!(
            "Wrote {} articles to cache file {}",
            self.entries.len(),
            path.display()
        );
        Ok(())
    }
}
