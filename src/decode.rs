//! MIME projections over raw articles
//!
//! Everything here is recomputed per call and never cached: the cache holds
//! raw protocol payloads only, so decoding policy can change without
//! invalidating anything on disk.
//!
//! Structure and transfer decoding come from `mailparse`; charset handling is
//! done here on the raw `Content-Type` value, because the policy is the
//! interesting part: a part with a missing or unrecognized charset yields *no
//! body* (logged, not raised), whereas an attachment part with no filename
//! fails the whole extraction. The two paths are intentionally asymmetric.

use std::collections::HashMap;

use mailparse::{MailHeaderMap, ParsedMail};
use tracing::warn;

use crate::error::ArchiveError;
use crate::types::{ArticleId, RawArticle};

/// Content type selected as the message body, first match wins
///
/// Exact `text/plain`, not `text/*`: the broader match would also admit
/// `text/html`, which is never what a plain-text archive reader wants.
const BODY_CONTENT_TYPE: &str = "text/plain";

/// Look up a `;`-separated parameter in a structured header value
///
/// Handles values like `text/plain; charset=UTF-8; format=flowed` and
/// `attachment; filename="hitori.master.da.podiff"`: tokenize on `;`, trim,
/// split at the first `=`, match the name case-insensitively and strip one
/// layer of matching double quotes. Shared by the charset and filename
/// call sites, which need identical semantics.
pub fn parameter<'a>(header_value: &'a str, name: &str) -> Option<&'a str> {
    for segment in header_value.split(';') {
        let Some((key, value)) = segment.split_once('=') else {
            continue;
        };
        if key.trim().eq_ignore_ascii_case(name) {
            let value = value.trim();
            return Some(
                value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(value),
            );
        }
    }
    None
}

/// Parse a joined article blob into a MIME message
///
/// The returned message borrows `blob`, so callers materialize the blob
/// first and keep it alive for the duration of the walk.
fn parse_message(id: ArticleId, blob: &[u8]) -> Result<ParsedMail<'_>, ArchiveError> {
    mailparse::parse_mail(blob).map_err(|source| ArchiveError::MalformedMessage { id, source })
}

/// Flat preorder walk over all parts, multipart containers included
fn all_parts<'p, 'a>(mail: &'p ParsedMail<'a>) -> Vec<&'p ParsedMail<'a>> {
    let mut parts = Vec::new();
    let mut stack = vec![mail];
    while let Some(part) = stack.pop() {
        parts.push(part);
        // Push in reverse so document order comes out of the stack
        for sub in part.subparts.iter().rev() {
            stack.push(sub);
        }
    }
    parts
}

/// Decode the `Subject` header, including RFC 2047 encoded words
///
/// A value like `=?UTF-8?Q?Hej?=` comes back as `Hej`; mailparse performs
/// the encoded-word decoding when materializing the header value.
pub fn subject(id: ArticleId, raw: &RawArticle) -> Result<String, ArchiveError> {
    let blob = raw.as_bytes();
    let mail = parse_message(id, &blob)?;
    mail.headers
        .get_first_value("Subject")
        .ok_or_else(|| ArchiveError::MissingHeader {
            id,
            name: "Subject".to_string(),
        })
}

/// Decode the plain-text body of an article
///
/// Walks parts in document order and decodes the first `text/plain` part
/// using the charset declared on its `Content-Type` header. Soft failures
/// (no charset parameter, unrecognized charset label, payload that is not
/// valid text in the declared charset) log a warning and yield `Ok(None)` -
/// partially decoded text is never returned. `Ok(None)` is also the answer
/// when no part matches at all.
pub fn body(id: ArticleId, raw: &RawArticle) -> Result<Option<String>, ArchiveError> {
    let blob = raw.as_bytes();
    let mail = parse_message(id, &blob)?;

    for part in all_parts(&mail) {
        if part.ctype.mimetype != BODY_CONTENT_TYPE {
            continue;
        }

        let payload = part
            .get_body_raw()
            .map_err(|source| ArchiveError::MalformedMessage { id, source })?;

        let Some(content_type) = part.headers.get_first_value("Content-Type") else {
            warn!("Article {}: body part has no Content-Type header", id);
            return Ok(None);
        };

        let Some(label) = parameter(&content_type, "charset") else {
            warn!(
                "Article {}: no charset parameter in Content-Type '{}'",
                id, content_type
            );
            return Ok(None);
        };

        let Some(encoding) = charset::Charset::for_label(label.as_bytes()) else {
            warn!("Article {}: unknown charset '{}'", id, label);
            return Ok(None);
        };

        let (text, _, malformed) = encoding.decode(&payload);
        if malformed {
            warn!(
                "Article {}: body is not valid '{}' text, discarding",
                id, label
            );
            return Ok(None);
        }

        // First match wins; never continue to later text parts
        return Ok(Some(text.into_owned()));
    }

    Ok(None)
}

/// Extract all attachments as a filename -> raw bytes mapping
///
/// A part counts as an attachment when its `Content-Disposition` value
/// begins with `attachment`. The payload is the transfer-decoded bytes,
/// never text-decoded. Duplicate filenames are last-write-wins in document
/// order. An attachment-disposed part without a `filename` parameter fails
/// the whole call - stricter than the body path, deliberately so.
pub fn attachments(
    id: ArticleId,
    raw: &RawArticle,
) -> Result<HashMap<String, Vec<u8>>, ArchiveError> {
    let blob = raw.as_bytes();
    let mail = parse_message(id, &blob)?;
    let mut found = HashMap::new();

    for part in all_parts(&mail) {
        let Some(disposition) = part.headers.get_first_value("Content-Disposition") else {
            continue;
        };
        if !disposition
            .trim_start()
            .to_ascii_lowercase()
            .starts_with("attachment")
        {
            continue;
        }

        let Some(filename) = parameter(&disposition, "filename") else {
            return Err(ArchiveError::MissingFilename { id, disposition });
        };

        let payload = part
            .get_body_raw()
            .map_err(|source| ArchiveError::MalformedMessage { id, source })?;
        found.insert(filename.to_string(), payload);
    }

    Ok(found)
}
