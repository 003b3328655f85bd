use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use nntp_archive::{
    init_logging, load_config, ArchiveConfig, ArticleId, NewsArchive, NntpSession,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML)
    #[arg(short, long, env = "NEWS_ARCHIVE_CONFIG")]
    config: Option<String>,

    /// News server hostname (overrides config file)
    #[arg(long, env = "NEWS_ARCHIVE_HOST")]
    host: Option<String>,

    /// News server port (overrides config file)
    #[arg(long, env = "NEWS_ARCHIVE_PORT")]
    port: Option<u16>,

    /// Newsgroup name (overrides config file)
    #[arg(long, env = "NEWS_ARCHIVE_GROUP")]
    group: Option<String>,

    /// Article cache capacity (overrides config file)
    #[arg(long, env = "NEWS_ARCHIVE_CACHE_SIZE")]
    cache_size: Option<usize>,

    /// Cache persistence path (overrides config file)
    #[arg(long, env = "NEWS_ARCHIVE_CACHE_FILE")]
    cache_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the group's current high-water article id
    Last,
    /// Print the decoded subject of an article
    Subject { id: ArticleId },
    /// Print the decoded plain-text body of an article
    Body { id: ArticleId },
    /// List the attachments of an article
    Attachments { id: ArticleId },
    /// Save one attachment of an article to the current directory
    Attachment { id: ArticleId, filename: String },
    /// Print the bodies of the most recent articles
    Tail {
        /// How many articles to print, counting back from the newest
        #[arg(default_value_t = 10)]
        count: u64,
    },
}

impl Args {
    /// Build the effective configuration: config file first, then overrides
    fn resolve_config(&self) -> Result<ArchiveConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => {
                let host = self
                    .host
                    .clone()
                    .context("No config file given; --host is required")?;
                let group = self
                    .group
                    .clone()
                    .context("No config file given; --group is required")?;
                ArchiveConfig::new(host, group)
            }
        };

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(group) = &self.group {
            config.group = group.clone();
        }
        if let Some(size) = self.cache_size {
            config.cache_size = size;
        }
        if let Some(path) = &self.cache_file {
            config.cache_file = Some(path.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

async fn run(args: Args) -> Result<()> {
    let config = args.resolve_config()?;

    let session = NntpSession::connect(&config.host, config.port).await?;
    let mut archive = NewsArchive::open(session, &config).await?;

    let outcome = execute(&mut archive, &args.command).await;
    info!(
        "Cache: {}/{} articles, {} hits, {} misses",
        archive.cache_len(),
        archive.cache_capacity(),
        archive.cache_hits(),
        archive.cache_misses()
    );
    archive.close().await?;
    outcome
}

async fn execute(archive: &mut NewsArchive<NntpSession>, command: &Command) -> Result<()> {
    match command {
        Command::Last => {
            println!("{}", archive.last().await?);
        }
        Command::Subject { id } => {
            println!("{}", archive.get_subject(*id).await?);
        }
        Command::Body { id } => match archive.get_body(*id).await? {
            Some(body) => println!("{}", body),
            None => println!("(no decodable plain-text body)"),
        },
        Command::Attachments { id } => {
            let attachments = archive.get_attachments(*id).await?;
            if attachments.is_empty() {
                println!("(no attachments)");
            }
            for (filename, content) in &attachments {
                println!("{}\t{} bytes", filename, content.len());
            }
        }
        Command::Attachment { id, filename } => {
            match archive.get_attachment(*id, filename).await? {
                Some(content) => {
                    std::fs::write(filename, &content)
                        .with_context(|| format!("Failed to write '{}'", filename))?;
                    println!("Wrote {} ({} bytes)", filename, content.len());
                }
                None => anyhow::bail!("Article {} has no attachment '{}'", id, filename),
            }
        }
        Command::Tail { count } => {
            let last = archive.last().await?.get();
            let first = last.saturating_sub(count.saturating_sub(1));
            for n in first..=last {
                let id = ArticleId::new(n);
                match archive.get_body(id).await {
                    Ok(Some(body)) => {
                        println!("=== {} ===\n{}", id, body);
                    }
                    Ok(None) => println!("=== {} ===\n(no decodable body)", id),
                    // Article numbers are not contiguous; skip the holes
                    Err(e) if e.is_not_found() => debug!("Skipping article {}: {}", id, e),
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();
    run(args).await
}
