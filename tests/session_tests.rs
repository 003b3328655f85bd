//! NNTP wire-level tests against a scripted in-process server
//!
//! Tests for:
//! - Greeting handling (200/201 accepted, anything else rejected)
//! - GROUP response parsing and failure mapping
//! - ARTICLE multiline reads with dot-stuffing undone
//! - QUIT and end-to-end use through the archive facade

use std::net::SocketAddr;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use nntp_archive::error::ArchiveError;
use nntp_archive::session::{NewsSession, NntpSession};
use nntp_archive::types::ArticleId;
use nntp_archive::{ArchiveConfig, NewsArchive};

/// Spawn a one-connection NNTP server that answers commands via `respond`
///
/// The server sends `greeting` on accept, then feeds each received command
/// line to the closure and writes back whatever it returns. The connection
/// ends after a QUIT or when the client hangs up.
async fn start_server<F>(greeting: &str, mut respond: F) -> SocketAddr
where
    F: FnMut(&str) -> String + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let greeting = format!("{}\r\n", greeting);

    tokio::spawn(async move {
        let Ok((stream, _)) = listener.accept().await else {
            return;
        };
        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();

        if write_half.write_all(greeting.as_bytes()).await.is_err() {
            return;
        }

        while let Ok(Some(line)) = lines.next_line().await {
            let command = line.trim_end();
            let response = respond(command);
            if write_half.write_all(response.as_bytes()).await.is_err() {
                return;
            }
            if command.starts_with("QUIT") {
                return;
            }
        }
    });

    addr
}

/// Canned responses for a tiny single-group archive
fn archive_server_script(command: &str) -> String {
    match command {
        "GROUP example.list" => "211 3 1 3 example.list\r\n".to_string(),
        "ARTICLE 1" => concat!(
            "220 1 <1@example> article follows\r\n",
            "Subject: =?UTF-8?Q?Hej?=\r\n",
            "Content-Type: text/plain; charset=UTF-8\r\n",
            "\r\n",
            "..dot-stuffed line\r\n",
            "Hej Verden\r\n",
            ".\r\n",
        )
        .to_string(),
        "ARTICLE 2" => "430 No such article\r\n".to_string(),
        "QUIT" => "205 Goodbye\r\n".to_string(),
        _ => "500 Unknown command\r\n".to_string(),
    }
}

#[tokio::test]
async fn test_connect_accepts_posting_greeting() -> Result<()> {
    let addr = start_server("200 server ready, posting allowed", archive_server_script).await;
    let mut session = NntpSession::connect(&addr.ip().to_string(), addr.port()).await?;
    session.quit().await?;
    Ok(())
}

#[tokio::test]
async fn test_connect_accepts_readonly_greeting() -> Result<()> {
    let addr = start_server("201 server ready, no posting", archive_server_script).await;
    let mut session = NntpSession::connect(&addr.ip().to_string(), addr.port()).await?;
    session.quit().await?;
    Ok(())
}

#[tokio::test]
async fn test_connect_rejects_bad_greeting() {
    let addr = start_server("400 service temporarily unavailable", archive_server_script).await;
    let err = NntpSession::connect(&addr.ip().to_string(), addr.port())
        .await
        .err()
        .expect("greeting should be rejected");
    assert!(matches!(err, ArchiveError::Greeting { .. }));
}

#[tokio::test]
async fn test_connect_refused() {
    // Port 1 on localhost is essentially never listening
    let err = NntpSession::connect("127.0.0.1", 1).await.err().unwrap();
    assert!(err.is_transport_error());
}

#[tokio::test]
async fn test_select_group() -> Result<()> {
    let addr = start_server("200 ready", archive_server_script).await;
    let mut session = NntpSession::connect(&addr.ip().to_string(), addr.port()).await?;

    let status = session.select_group("example.list").await?;
    assert_eq!(status.count, 3);
    assert_eq!(status.low, ArticleId::new(1));
    assert_eq!(status.high, ArticleId::new(3));
    assert_eq!(status.name, "example.list");

    session.quit().await?;
    Ok(())
}

#[tokio::test]
async fn test_select_unknown_group() -> Result<()> {
    let addr = start_server("200 ready", |command: &str| {
        if command.starts_with("GROUP") {
            "411 No such newsgroup\r\n".to_string()
        } else {
            "205 Goodbye\r\n".to_string()
        }
    })
    .await;
    let mut session = NntpSession::connect(&addr.ip().to_string(), addr.port()).await?;

    let err = session.select_group("no.such.group").await.unwrap_err();
    assert!(matches!(err, ArchiveError::GroupSelection { .. }));
    Ok(())
}

#[tokio::test]
async fn test_fetch_article_undoes_dot_stuffing() -> Result<()> {
    let addr = start_server("200 ready", archive_server_script).await;
    let mut session = NntpSession::connect(&addr.ip().to_string(), addr.port()).await?;

    let article = session.fetch_article(ArticleId::new(1)).await?;
    let lines = article.lines();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], b"Subject: =?UTF-8?Q?Hej?=");
    assert_eq!(lines[2], b"");
    // The doubled leading dot comes back single, the terminator is consumed
    assert_eq!(lines[3], b".dot-stuffed line");
    assert_eq!(lines[4], b"Hej Verden");

    session.quit().await?;
    Ok(())
}

#[tokio::test]
async fn test_fetch_missing_article() -> Result<()> {
    let addr = start_server("200 ready", archive_server_script).await;
    let mut session = NntpSession::connect(&addr.ip().to_string(), addr.port()).await?;

    let err = session.fetch_article(ArticleId::new(2)).await.unwrap_err();
    assert!(err.is_not_found());

    // The session stays usable after a 430
    let article = session.fetch_article(ArticleId::new(1)).await?;
    assert_eq!(article.lines()[4], b"Hej Verden");
    Ok(())
}

/// Full path: connect, open the archive, read an article, close
#[tokio::test]
async fn test_archive_over_live_session() -> Result<()> {
    let addr = start_server("200 ready", archive_server_script).await;

    let mut config = ArchiveConfig::new(addr.ip().to_string(), "example.list");
    config.port = addr.port();

    let session = NntpSession::connect(&config.host, config.port).await?;
    let mut archive = NewsArchive::open(session, &config).await?;

    assert_eq!(archive.last().await?, ArticleId::new(3));
    assert_eq!(archive.get_subject(ArticleId::new(1)).await?, "Hej");

    let body = archive.get_body(ArticleId::new(1)).await?.unwrap();
    assert!(body.contains("Hej Verden"));
    assert!(body.contains(".dot-stuffed line"));

    archive.close().await?;
    Ok(())
}
