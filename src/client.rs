//! Mailbox session and fetch coordination
//!
//! [`MailSession`] owns one IMAP session and exposes the lifecycle
//! as sequential steps: connect, open a mailbox, search, fetch,
//! end. The fetch path is the coordinator: one bulk FETCH for all
//! matched ids, one record-builder task per delivered message, and
//! an all-or-nothing aggregate collected in completion order.

use crate::config::ImapConfig;
use crate::connection::{self, ImapSession};
use crate::criteria::SearchCriteria;
use crate::error::{Error, Result};
use crate::record::MailRecord;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::task;
use tokio::time::timeout;
use tracing::{debug, info};

/// A single-connection IMAP mail session.
///
/// All operations run on the one underlying connection; calling
/// anything other than [`MailSession::connect`] or
/// [`MailSession::end`] before connecting fails with
/// [`Error::Connection`]. Every network wait is bounded by the
/// configured timeout.
pub struct MailSession {
    config: ImapConfig,
    session: Option<ImapSession>,
}

impl MailSession {
    #[must_use]
    pub const fn new(config: ImapConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// Connect and log in.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP connect, TLS handshake, or LOGIN
    /// fails, or if the attempt exceeds the configured timeout.
    pub async fn connect(&mut self) -> Result<()> {
        let session = timeout(self.config.timeout, connection::connect(&self.config))
            .await
            .map_err(|_| Error::Timeout("connect".into()))??;
        self.session = Some(session);
        Ok(())
    }

    /// SELECT a mailbox, returning its name on success.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mailbox`] if selection fails (unknown
    /// mailbox, permission).
    pub async fn open_box(&mut self, name: &str) -> Result<String> {
        let wait = self.config.timeout;
        let session = self.session_mut()?;

        timeout(wait, session.select(name))
            .await
            .map_err(|_| Error::Timeout(format!("SELECT {name}")))?
            .map_err(|e| Error::Mailbox(format!("Failed to select {name}: {e}")))?;

        info!("Opened mailbox {}", name);
        Ok(name.to_string())
    }

    /// Run a SEARCH, returning matching sequence numbers in
    /// ascending order. An empty result is a valid success.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Search`] on malformed criteria or a
    /// transport fault.
    pub async fn search(&mut self, criteria: &SearchCriteria) -> Result<Vec<u32>> {
        let query = criteria.to_string();
        let wait = self.config.timeout;
        let session = self.session_mut()?;

        let ids = timeout(wait, session.search(&query))
            .await
            .map_err(|_| Error::Timeout(format!("SEARCH {query}")))?
            .map_err(|e| Error::Search(format!("Search '{query}' failed: {e}")))?;

        let mut ids: Vec<u32> = ids.into_iter().collect();
        ids.sort_unstable();

        info!("Found {} messages matching '{}'", ids.len(), query);
        Ok(ids)
    }

    /// Fetch full messages for the given sequence numbers and parse
    /// each into a [`MailRecord`].
    ///
    /// An empty id list resolves to an empty vec immediately, with
    /// no FETCH issued. Records are aggregated in the order each
    /// message finishes parsing, not in request order, and the call
    /// resolves only once every delivered message has completed. A
    /// single parse failure fails the whole batch; no partial result
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`] on transport faults or when the
    /// server delivers fewer messages than requested, and
    /// [`Error::Parse`]/[`Error::Header`] when a message cannot be
    /// assembled into a record.
    pub async fn fetch(&mut self, ids: &[u32]) -> Result<Vec<MailRecord>> {
        if ids.is_empty() {
            debug!("Fetch with no ids, nothing to do");
            return Ok(Vec::new());
        }

        let seq_set = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let wait = self.config.timeout;
        let session = self.session_mut()?;

        // Drain the whole fetch response first; arrival order is
        // transport-determined and the stream borrows the session.
        let mut raw_messages = Vec::new();
        {
            let mut messages = timeout(wait, session.fetch(&seq_set, "(BODY.PEEK[] UID)"))
                .await
                .map_err(|_| Error::Timeout(format!("FETCH {seq_set}")))?
                .map_err(|e| Error::Fetch(format!("Fetch failed: {e}")))?;

            loop {
                let next = timeout(wait, messages.next())
                    .await
                    .map_err(|_| Error::Timeout(format!("FETCH {seq_set}")))?;
                let Some(item) = next else { break };

                let msg = item.map_err(|e| Error::Fetch(format!("Fetch error: {e}")))?;
                let body = msg
                    .body()
                    .ok_or_else(|| {
                        Error::Fetch(format!("No body found for message {}", msg.message))
                    })?
                    .to_vec();
                raw_messages.push((msg.message, msg.uid, body));
            }
        }

        // A short delivery would otherwise leave the batch waiting
        // on completions that never arrive.
        if raw_messages.len() != ids.len() {
            return Err(Error::Fetch(format!(
                "Server delivered {} of {} requested messages",
                raw_messages.len(),
                ids.len()
            )));
        }

        // One builder task per message, aggregated in completion
        // order. The batch resolves only after every task finishes;
        // the first failure rejects it with nothing salvaged.
        let mut parses = FuturesUnordered::new();
        for (seqno, uid, body) in raw_messages {
            parses.push(task::spawn_blocking(move || {
                MailRecord::parse(seqno, uid, &body)
            }));
        }

        let mut records = Vec::with_capacity(ids.len());
        while let Some(joined) = parses.next().await {
            let record =
                joined.map_err(|e| Error::Parse(format!("Parser task failed: {e}")))??;
            records.push(record);
        }

        info!("Fetched {} messages", records.len());
        Ok(records)
    }

    /// Search and fetch in one step.
    ///
    /// # Errors
    ///
    /// Propagates the first error from [`MailSession::search`] or
    /// [`MailSession::fetch`].
    pub async fn fetch_mail(&mut self, criteria: &SearchCriteria) -> Result<Vec<MailRecord>> {
        let ids = self.search(criteria).await?;
        self.fetch(&ids).await
    }

    /// LOGOUT and drop the connection.
    ///
    /// Ending a session that is not connected is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Close`] if the server rejects the logout,
    /// or [`Error::Timeout`] if it never confirms closure.
    pub async fn end(&mut self) -> Result<()> {
        let wait = self.config.timeout;
        let Some(mut session) = self.session.take() else {
            debug!("end() called without a connected session");
            return Ok(());
        };

        timeout(wait, session.logout())
            .await
            .map_err(|_| Error::Timeout("LOGOUT".into()))?
            .map_err(|e| Error::Close(format!("Logout failed: {e}")))?;

        info!("Session ended");
        Ok(())
    }

    fn session_mut(&mut self) -> Result<&mut ImapSession> {
        self.session
            .as_mut()
            .ok_or_else(|| Error::Connection("Session is not connected".into()))
    }
}
