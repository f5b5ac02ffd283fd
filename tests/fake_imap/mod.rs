//! Fake IMAP server for integration testing
//!
//! An in-process IMAP server that speaks enough of the protocol to
//! exercise `MailSession` end-to-end:
//!
//! TCP -> greeting -> LOGIN -> SELECT -> SEARCH -> FETCH -> LOGOUT
//!
//! The server runs over plain TCP; the tests configure the client
//! with TLS disabled.
//!
//! ## Module layout
//!
//! - `server` -- TCP listener and connection dispatch
//! - `handlers/` -- one file per IMAP command (SELECT, SEARCH, etc.)
//! - `mailbox` -- test data model (folders, emails, builder)
//! - `io` -- shared write helpers


pub use mailbox::MailboxBuilder;
pub use server::FakeImapServer;
