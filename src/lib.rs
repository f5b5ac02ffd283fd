//! IMAP fetch-and-parse pipeline
//!
//! Connects to an IMAP mailbox, searches it with typed criteria
//! (unseen, since a date, subject match), streams each matched
//! message through a MIME parser, and returns structured
//! [`MailRecord`]s with sender, subject, body text, and decoded
//! attachment buffers.
//!
//! The IMAP protocol is handled by [`async_imap`] and MIME decoding
//! by [`mail_parser`]; this crate is the orchestration between them.

mod client;
mod config;
mod connection;
mod criteria;
mod error;
mod record;

pub use client::MailSession;
pub use config::ImapConfig;
pub use criteria::{SearchCriteria, SearchTerm};
pub use error::{Error, Result};
pub use record::{Attachment, MailRecord};
