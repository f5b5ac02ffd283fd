//! Structured mail records built from raw message bytes
//!
//! [`MailRecord::parse`] is the per-message record builder: it runs
//! one fetched message through the MIME parser and assembles the
//! sender, subject, date, plain-text body, and decoded attachment
//! buffers into a single immutable record.

use crate::error::{Error, Result};
use mail_parser::{MessageParser, MimeHeaders};
use serde::Serialize;
use tracing::debug;

/// An attachment reconstructed from a message part.
///
/// Immutable once built; `size` always equals `bytes.len()`.
#[derive(Debug, Clone, Serialize)]
pub struct Attachment {
    /// Fully decoded attachment content. Omitted from JSON output.
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// MIME type, e.g. `application/pdf`. Falls back to
    /// `application/octet-stream` when the part carries none.
    pub mime_type: String,
    /// Decoded size in bytes.
    pub size: usize,
    /// Filename from the part headers, if any.
    pub original_name: Option<String>,
}

/// One fetched and parsed message.
#[derive(Debug, Clone, Serialize)]
pub struct MailRecord {
    /// Display name of the first From entry, if present.
    pub from_name: Option<String>,
    /// Address of the first From entry, lowercased.
    pub from_address: Option<String>,
    pub subject: Option<String>,
    /// Date header rendered as RFC 3339, if the message carried one.
    pub date: Option<String>,
    /// Decoded plain-text body. When a message contains several text
    /// parts the last one wins; earlier parts are overwritten.
    pub body: Option<String>,
    /// Attachments in part order.
    pub files: Vec<Attachment>,
    /// Transient sequence number from the fetch.
    pub seqno: u32,
    /// Mailbox UID from the fetch attributes, if reported.
    pub uid: Option<u32>,
}

impl MailRecord {
    /// Build a record from one message's raw RFC 2822 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the bytes are not a parseable
    /// message, and [`Error::Header`] if the From header is missing
    /// or carries no address. A malformed From is a hard failure by
    /// design; it is not silently tolerated.
    pub fn parse(seqno: u32, uid: Option<u32>, raw: &[u8]) -> Result<Self> {
        debug!("Processing msg {}", seqno);

        let message = MessageParser::default()
            .parse(raw)
            .ok_or_else(|| Error::Parse(format!("Message {seqno} is not parseable")))?;

        let sender = message
            .from()
            .and_then(|from| from.first())
            .ok_or_else(|| Error::Header(format!("Message {seqno} has no From entry")))?;

        let from_address = sender
            .address()
            .ok_or_else(|| {
                Error::Header(format!("Message {seqno} From entry has no address"))
            })?
            .to_lowercase();
        let from_name = sender.name().map(ToString::to_string);

        let subject = message.subject().map(ToString::to_string);
        let date = message.date().map(mail_parser::DateTime::to_rfc3339);

        // Last-write-wins: each further text part replaces the body.
        let mut body = None;
        let mut pos = 0;
        while let Some(text) = message.body_text(pos) {
            body = Some(text.into_owned());
            pos += 1;
        }

        let mut files = Vec::new();
        for part in message.attachments() {
            let bytes = part.contents().to_vec();
            let mime_type = part
                .content_type()
                .map_or_else(
                    || "application/octet-stream".to_string(),
                    |ct| match ct.subtype() {
                        Some(sub) => format!("{}/{sub}", ct.ctype()),
                        None => ct.ctype().to_string(),
                    },
                );

            files.push(Attachment {
                size: bytes.len(),
                mime_type,
                original_name: part.attachment_name().map(ToString::to_string),
                bytes,
            });
        }

        debug!("Finished msg {}", seqno);

        Ok(Self {
            from_name,
            from_address: Some(from_address),
            subject,
            date,
            body,
            files,
            seqno,
            uid,
        })
    }
}
