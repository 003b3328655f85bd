//! Archive facade
//!
//! Composes a session, the bounded article cache and the MIME decoder into
//! the public read operations. The open/close lifecycle is enforced by the
//! type system: `open` constructs the archive, `close` consumes it, so no
//! operation can be issued outside the open window.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::cache::ArticleCache;
use crate::config::ArchiveConfig;
use crate::decode;
use crate::error::ArchiveError;
use crate::session::NewsSession;
use crate::types::ArticleId;

/// Read-only view of one newsgroup archive
///
/// Generic over the session so tests (and multi-server setups) can supply
/// their own `NewsSession` implementation. The archive owns the session:
/// one connection, one selected group, no sharing.
pub struct NewsArchive<S: NewsSession> {
    session: S,
    group: String,
    cache: ArticleCache,
    cache_file: Option<PathBuf>,
}

impl<S: NewsSession> NewsArchive<S> {
    /// Open the archive: select the group and load any persisted cache
    ///
    /// A missing or corrupt cache file never fails the open; it just means
    /// starting with an empty cache.
    pub async fn open(mut session: S, config: &ArchiveConfig) -> Result<Self, ArchiveError> {
        let status = session.select_group(&config.group).await?;
        info!(
            "Opened group '{}': {} articles ({}..{})",
            status.name, status.count, status.low, status.high
        );

        let cache = match &config.cache_file {
            Some(path) => ArticleCache::load(path, config.cache_size),
            None => ArticleCache::new(config.cache_size),
        };

        Ok(Self {
            session,
            group: config.group.clone(),
            cache,
            cache_file: config.cache_file.clone(),
        })
    }

    /// Current high-water article id of the group
    ///
    /// Always a live GROUP round-trip: group state moves as new list mail
    /// arrives, so this is never answered from the article cache.
    pub async fn last(&mut self) -> Result<ArticleId, ArchiveError> {
        let status = self.session.select_group(&self.group).await?;
        Ok(status.high)
    }

    /// Decoded subject of an article
    pub async fn get_subject(&mut self, id: ArticleId) -> Result<String, ArchiveError> {
        let raw = self.cache.get_or_fetch(id, &mut self.session).await?;
        decode::subject(id, &raw)
    }

    /// Decoded plain-text body of an article
    ///
    /// `Ok(None)` when the body's charset is missing, unrecognized or does
    /// not decode cleanly - those are logged soft failures, not errors.
    pub async fn get_body(&mut self, id: ArticleId) -> Result<Option<String>, ArchiveError> {
        let raw = self.cache.get_or_fetch(id, &mut self.session).await?;
        decode::body(id, &raw)
    }

    /// All attachments of an article as filename -> raw bytes
    ///
    /// Empty when the message has no attachment-disposed parts. Fails if an
    /// attachment part carries no filename parameter.
    pub async fn get_attachments(
        &mut self,
        id: ArticleId,
    ) -> Result<HashMap<String, Vec<u8>>, ArchiveError> {
        let raw = self.cache.get_or_fetch(id, &mut self.session).await?;
        decode::attachments(id, &raw)
    }

    /// One attachment by filename, `None` if the message has no such part
    ///
    /// Defined as extract-all-then-look-up; there is no cheaper single-file
    /// path, and none is needed since projections are per-call anyway.
    pub async fn get_attachment(
        &mut self,
        id: ArticleId,
        filename: &str,
    ) -> Result<Option<Vec<u8>>, ArchiveError> {
        let mut all = self.get_attachments(id).await?;
        Ok(all.remove(filename))
    }

    /// Close the archive: quit the session, then persist the cache
    ///
    /// A failed save is logged and swallowed - losing the cache costs
    /// re-fetches later, not correctness now.
    pub async fn close(mut self) -> Result<(), ArchiveError> {
        self.session.quit().await?;

        if let Some(path) = &self.cache_file {
            if let Err(e) = self.cache.save(path) {
                warn!("{}", e);
            }
        }
        Ok(())
    }

    /// Number of articles currently cached
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Cache capacity, fixed at construction
    #[must_use]
    pub fn cache_capacity(&self) -> usize {
        self.cache.capacity()
    }

    /// Cache hit count for this session
    #[must_use]
    pub fn cache_hits(&self) -> u64 {
        self.cache.hits()
    }

    /// Cache miss count for this session
    #[must_use]
    pub fn cache_misses(&self) -> u64 {
        self.cache.misses()
    }
}
