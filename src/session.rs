//! NNTP session handling
//!
//! One session owns one authenticated connection with one selected group.
//! The `NewsSession` trait is the seam used by the archive facade, so tests
//! can substitute a scripted session without a network.
//!
//! The wire handling is the minimum read-side subset of
//! [RFC 3977](https://datatracker.ietf.org/doc/html/rfc3977): greeting,
//! GROUP ([Section 6.1.1](https://datatracker.ietf.org/doc/html/rfc3977#section-6.1.1)),
//! ARTICLE by number ([Section 6.2.1](https://datatracker.ietf.org/doc/html/rfc3977#section-6.2.1))
//! and QUIT. No posting, no authentication extensions.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::error::ArchiveError;
use crate::types::{ArticleId, GroupStatus, RawArticle};

/// Session boundary consumed by the archive facade
///
/// All methods take `&mut self`: a session is one socket plus one selected
/// group, and callers must hold the exclusive borrow for the whole
/// request/response exchange.
#[async_trait]
pub trait NewsSession: Send {
    /// Select a newsgroup, returning its current state
    async fn select_group(&mut self, group: &str) -> Result<GroupStatus, ArchiveError>;

    /// Fetch the complete raw article (headers + body) by number
    async fn fetch_article(&mut self, id: ArticleId) -> Result<RawArticle, ArchiveError>;

    /// Terminate the session cleanly
    async fn quit(&mut self) -> Result<(), ArchiveError>;
}

/// Extract the 3-digit status code from an NNTP response line
fn status_code(line: &str) -> Option<u16> {
    line.get(..3)?.parse::<u16>().ok()
}

/// Parse a `211 count low high group` response into a `GroupStatus`
fn parse_group_response(line: &str) -> Result<GroupStatus, ArchiveError> {
    let mut fields = line.split_ascii_whitespace();
    let status = fields.next();
    if status != Some("211") {
        return Err(ArchiveError::Protocol {
            message: format!("Expected 211 group response, got: {}", line),
        });
    }

    let parse_number = |field: Option<&str>| -> Result<u64, ArchiveError> {
        field
            .and_then(|f| f.parse::<u64>().ok())
            .ok_or_else(|| ArchiveError::Protocol {
                message: format!("Malformed group response: {}", line),
            })
    };

    let count = parse_number(fields.next())?;
    let low = parse_number(fields.next())?;
    let high = parse_number(fields.next())?;
    let name = fields.next().unwrap_or_default().to_string();

    Ok(GroupStatus {
        count,
        low: ArticleId::new(low),
        high: ArticleId::new(high),
        name,
    })
}

/// Live NNTP session over a TCP connection
pub struct NntpSession {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    /// Peer label for log messages
    peer: String,
}

impl NntpSession {
    /// Connect to a news server and consume the greeting
    ///
    /// Accepts both `200` (posting allowed) and `201` (read-only) greetings;
    /// this client never posts, so the distinction does not matter here.
    pub async fn connect(host: &str, port: u16) -> Result<Self, ArchiveError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|source| ArchiveError::Connect {
                host: host.to_string(),
                port,
                source,
            })?;

        let (read_half, write_half) = stream.into_split();
        let mut session = Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            peer: format!("{}:{}", host, port),
        };

        let greeting = session.read_response_line().await?;
        match status_code(&greeting) {
            Some(200) | Some(201) => {
                info!("Connected to {}: {}", session.peer, greeting);
                Ok(session)
            }
            _ => Err(ArchiveError::Greeting { response: greeting }),
        }
    }

    /// Send one command line, CRLF-terminated
    async fn send_command(&mut self, command: &str) -> Result<(), ArchiveError> {
        debug!("{} <- {}", self.peer, command);
        self.writer
            .write_all(format!("{}\r\n", command).as_bytes())
            .await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Read one raw line, without the trailing CRLF
    async fn read_raw_line(&mut self) -> Result<Vec<u8>, ArchiveError> {
        let mut line = Vec::new();
        let n = self.reader.read_until(b'\n', &mut line).await?;
        if n == 0 {
            return Err(ArchiveError::Protocol {
                message: format!("Connection to {} closed by server", self.peer),
            });
        }
        while line.last() == Some(&b'\n') || line.last() == Some(&b'\r') {
            line.pop();
        }
        Ok(line)
    }

    /// Read one status line as text
    async fn read_response_line(&mut self) -> Result<String, ArchiveError> {
        let line = self.read_raw_line().await?;
        let text = String::from_utf8_lossy(&line).into_owned();
        debug!("{} -> {}", self.peer, text);
        Ok(text)
    }

    /// Read a multiline data block, undoing dot-stuffing
    ///
    /// Per [RFC 3977 Section 3.1.1](https://datatracker.ietf.org/doc/html/rfc3977#section-3.1.1):
    /// the block ends with a line containing a single dot, and content lines
    /// beginning with a dot are sent with the dot doubled.
    async fn read_multiline_block(&mut self) -> Result<Vec<Vec<u8>>, ArchiveError> {
        let mut lines = Vec::new();
        loop {
            let mut line = self.read_raw_line().await?;
            if line == b"." {
                return Ok(lines);
            }
            if line.first() == Some(&b'.') {
                line.remove(0);
            }
            lines.push(line);
        }
    }
}

#[async_trait]
impl NewsSession for NntpSession {
    async fn select_group(&mut self, group: &str) -> Result<GroupStatus, ArchiveError> {
        self.send_command(&format!("GROUP {}", group)).await?;
        let response = self.read_response_line().await?;

        match status_code(&response) {
            Some(211) => parse_group_response(&response),
            _ => Err(ArchiveError::GroupSelection {
                group: group.to_string(),
                response,
            }),
        }
    }

    async fn fetch_article(&mut self, id: ArticleId) -> Result<RawArticle, ArchiveError> {
        self.send_command(&format!("ARTICLE {}", id)).await?;
        let response = self.read_response_line().await?;

        match status_code(&response) {
            Some(220) => {
                let lines = self.read_multiline_block().await?;
                debug!("Fetched article {} ({} lines)", id, lines.len());
                Ok(RawArticle::new(lines))
            }
            Some(423) | Some(430) => Err(ArchiveError::ArticleNotFound { id, response }),
            _ => Err(ArchiveError::Protocol {
                message: format!("Unexpected ARTICLE response: {}", response),
            }),
        }
    }

    async fn quit(&mut self) -> Result<(), ArchiveError> {
        self.send_command("QUIT").await?;
        let response = self.read_response_line().await?;
        debug!("{} session closed: {}", self.peer, response);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code() {
        assert_eq!(status_code("200 Ready"), Some(200));
        assert_eq!(status_code("430 No such article"), Some(430));
        assert_eq!(status_code("no code here"), None);
        assert_eq!(status_code(""), None);
        assert_eq!(status_code("20"), None);
    }

    #[test]
    fn test_parse_group_response() {
        let status =
            parse_group_response("211 1234 3000234 3002322 misc.test").unwrap();
        assert_eq!(status.count, 1234);
        assert_eq!(status.low, ArticleId::new(3000234));
        assert_eq!(status.high, ArticleId::new(3002322));
        assert_eq!(status.name, "misc.test");
    }

    #[test]
    fn test_parse_group_response_missing_name() {
        // Name field is informational; tolerate servers that omit it
        let status = parse_group_response("211 0 1 1").unwrap();
        assert_eq!(status.count, 0);
        assert_eq!(status.name, "");
    }

    #[test]
    fn test_parse_group_response_wrong_status() {
        let err = parse_group_response("411 No such newsgroup").unwrap_err();
        assert!(matches!(err, ArchiveError::Protocol { .. }));
    }

    #[test]
    fn test_parse_group_response_malformed() {
        let err = parse_group_response("211 not numbers here x").unwrap_err();
        assert!(matches!(err, ArchiveError::Protocol { .. }));
    }
}
