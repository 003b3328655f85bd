//! Error types for the archive client
//!
//! This module provides detailed error types for session, cache and decoding
//! failures, making it easier to diagnose and handle different scenarios.

use std::fmt;
use std::path::PathBuf;

use crate::types::ArticleId;

/// Errors that can occur while talking to the archive
#[derive(Debug)]
#[non_exhaustive]
pub enum ArchiveError {
    /// TCP connection to the news server failed
    Connect {
        host: String,
        port: u16,
        source: std::io::Error,
    },

    /// Server greeting was not a 200/201 status
    Greeting { response: String },

    /// GROUP command was rejected (unknown group, permission denied)
    GroupSelection { group: String, response: String },

    /// ARTICLE command failed for this article number (423/430)
    ArticleNotFound { id: ArticleId, response: String },

    /// Malformed or unexpected response from the server
    Protocol { message: String },

    /// I/O error during communication
    Io(std::io::Error),

    /// Article payload could not be parsed as a MIME message
    MalformedMessage {
        id: ArticleId,
        source: mailparse::MailParseError,
    },

    /// A required header is absent from the message
    MissingHeader { id: ArticleId, name: String },

    /// An attachment-disposed part carries no filename parameter
    ///
    /// This is a hard failure: it aborts attachment extraction for the whole
    /// message, unlike the body path which only warns on bad charsets.
    MissingFilename { id: ArticleId, disposition: String },

    /// Cache file could not be written at close
    CachePersist { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect { host, port, source } => {
                write!(f, "Failed to connect to {}:{}: {}", host, port, source)
            }
            Self::Greeting { response } => {
                write!(f, "Unexpected greeting from server: {}", response)
            }
            Self::GroupSelection { group, response } => {
                write!(f, "Failed to select group '{}': {}", group, response)
            }
            Self::ArticleNotFound { id, response } => {
                write!(f, "Article {} not available: {}", id, response)
            }
            Self::Protocol { message } => write!(f, "Protocol error: {}", message),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::MalformedMessage { id, source } => {
                write!(f, "Article {} is not a valid MIME message: {}", id, source)
            }
            Self::MissingHeader { id, name } => {
                write!(f, "Article {} has no '{}' header", id, name)
            }
            Self::MissingFilename { id, disposition } => {
                write!(
                    f,
                    "Attachment part in article {} has no filename parameter: {}",
                    id, disposition
                )
            }
            Self::CachePersist { path, source } => {
                write!(
                    f,
                    "Failed to persist article cache to {}: {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for ArchiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Connect { source, .. } => Some(source),
            Self::Io(e) => Some(e),
            Self::MalformedMessage { source, .. } => Some(source),
            Self::CachePersist { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl ArchiveError {
    /// Check if this error means the article simply does not exist
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ArticleNotFound { .. })
    }

    /// Check if this is a transport-level failure
    #[must_use]
    pub const fn is_transport_error(&self) -> bool {
        matches!(self, Self::Connect { .. } | Self::Io(_))
    }

    /// Get the appropriate log level for this error
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        match self {
            // Absent articles are routine for sparse groups
            Self::ArticleNotFound { .. } => tracing::Level::DEBUG,
            // Decoding problems mean the message itself is suspect
            Self::MalformedMessage { .. }
            | Self::MissingHeader { .. }
            | Self::MissingFilename { .. } => tracing::Level::WARN,
            // A lost save is annoying but not fatal to the session
            Self::CachePersist { .. } => tracing::Level::WARN,
            // Everything transport-ish needs attention
            _ => tracing::Level::ERROR,
        }
    }
}

impl From<std::io::Error> for ArchiveError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

// Note: no From<ArchiveError> for anyhow::Error is needed; anyhow has a
// blanket impl for all types implementing std::error::Error.
