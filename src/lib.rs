//! Read-only client for an NNTP-mirrored mailing-list archive
//!
//! The archive exposes per-message subject, plain-text body and file
//! attachments, with a bounded FIFO article cache in front of the network
//! session to avoid redundant round-trips. The cache can be persisted
//! across runs.
//!
//! # Example
//!
//! ```no_run
//! use nntp_archive::{ArchiveConfig, NewsArchive, NntpSession};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ArchiveConfig::new("news.gmane.io", "gmane.comp.internationalization.dansk");
//! let session = NntpSession::connect(&config.host, config.port).await?;
//! let mut archive = NewsArchive::open(session, &config).await?;
//!
//! let last = archive.last().await?;
//! if let Some(body) = archive.get_body(last).await? {
//!     println!("{}", body);
//! }
//!
//! archive.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod cache;
pub mod config;
pub mod decode;
pub mod error;
pub mod logging;
pub mod session;
pub mod types;

pub use archive::NewsArchive;
pub use cache::ArticleCache;
pub use config::{load_config, ArchiveConfig};
pub use error::ArchiveError;
pub use logging::init_logging;
pub use session::{NewsSession, NntpSession};
pub use types::{ArticleId, GroupStatus, RawArticle};
