//! FETCH command handler.
//!
//! The most involved IMAP response because it transfers message
//! bodies as **counted literals**:
//!
//! ```text
//! * <seq> FETCH (UID <uid> BODY[] {<length>}
//! <exactly length bytes of raw RFC 2822 message>
//! )
//! ```
//!
//! The `{length}\r\n` marker tells the client the next `length`
//! bytes are raw data, not protocol text; after reading them the
//! client expects the closing `)`. The pipeline under test issues
//! plain FETCH, so the sequence set carries 1-based sequence numbers
//! per RFC 3501 Section 7.4.2, and each response reports the stable
//! UID alongside.

use crate::fake_imap::io::{write_bytes, write_line};
use crate::fake_imap::mailbox::Mailbox;
use imap_codec::imap_types::sequence::{SeqOrUid, Sequence, SequenceSet};
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Extract sequence numbers from a `SequenceSet`. Only single values
/// are supported (not ranges), matching what `async-imap` sends for
/// a comma-separated id list.
fn extract_seqs(seq_set: &SequenceSet) -> Vec<u32> {
    seq_set
        .0
        .as_ref()
        .iter()
        .filter_map(|seq| match seq {
            Sequence::Single(SeqOrUid::Value(v)) => Some(v.get()),
            _ => None,
        })
        .collect()
}

/// Handle the FETCH command. Returns each requested email body as an
/// IMAP literal.
pub async fn handle_fetch<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    sequence_set: &SequenceSet,
    mailbox: &Mailbox,
    selected_folder: Option<&str>,
    stream: &mut BufReader<S>,
) {
    let Some(folder_name) = selected_folder else {
        let resp = format!("{tag} BAD No folder selected\r\n");
        let _ = write_line(stream, &resp).await;
        return;
    };

    let Some(folder) = mailbox.get_folder(folder_name) else {
        let resp = format!("{tag} BAD Folder not found\r\n");
        let _ = write_line(stream, &resp).await;
        return;
    };

    for seq in extract_seqs(sequence_set) {
        let idx = usize::try_from(seq).unwrap_or(usize::MAX);
        if idx == 0 || idx > folder.emails.len() {
            continue;
        }
        let email = &folder.emails[idx - 1];
        let uid = email.uid;
        let body_len = email.raw.len();

        let header = format!(
            "* {seq} FETCH (UID {uid} BODY[] \
             {{{body_len}}}\r\n"
        );
        if write_line(stream, &header).await.is_err() {
            return;
        }

        if write_bytes(stream, &email.raw).await.is_err() {
            return;
        }

        if write_line(stream, ")\r\n").await.is_err() {
            return;
        }
    }

    let resp = format!("{tag} OK FETCH completed\r\n");
    let _ = write_line(stream, &resp).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::mailbox::MailboxBuilder;
    use std::num::NonZeroU32;
    use tokio::io::BufReader;

    fn make_raw_email() -> Vec<u8> {
        b"From: a@b.com\r\nSubject: Test\r\n\r\nBody".to_vec()
    }

    fn seq_set(seqs: &[u32]) -> SequenceSet {
        SequenceSet(
            seqs.iter()
                .map(|s| Sequence::Single(SeqOrUid::Value(NonZeroU32::new(*s).unwrap())))
                .collect::<Vec<_>>()
                .try_into()
                .unwrap(),
        )
    }

    async fn run(
        tag: &str,
        sequence_set: &SequenceSet,
        mailbox: &Mailbox,
        selected: Option<&str>,
    ) -> String {
        let (client, server) = tokio::io::duplex(4096);
        let mut stream = BufReader::new(server);

        handle_fetch(tag, sequence_set, mailbox, selected, &mut stream).await;
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn fetches_email_by_sequence_number() {
        let raw = make_raw_email();
        let mailbox = MailboxBuilder::new()
            .folder("INBOX")
            .email(42, false, &raw)
            .build();

        let output = run("A1", &seq_set(&[1]), &mailbox, Some("INBOX")).await;

        // Sequence number 1, stable UID 42.
        assert!(output.contains("* 1 FETCH (UID 42 BODY[]"));
        assert!(output.contains("From: a@b.com"));
        assert!(output.contains("A1 OK FETCH completed"));
    }

    #[tokio::test]
    async fn fetches_multiple_messages() {
        let raw = make_raw_email();
        let mailbox = MailboxBuilder::new()
            .folder("INBOX")
            .email(10, false, &raw)
            .email(20, false, &raw)
            .email(30, false, &raw)
            .build();

        let output = run("A1", &seq_set(&[1, 3]), &mailbox, Some("INBOX")).await;

        assert!(output.contains("* 1 FETCH (UID 10 BODY[]"));
        assert!(!output.contains("UID 20"));
        assert!(output.contains("* 3 FETCH (UID 30 BODY[]"));
    }

    #[tokio::test]
    async fn literal_length_matches_body() {
        let raw = make_raw_email();
        let expected_len = raw.len();
        let mailbox = MailboxBuilder::new()
            .folder("INBOX")
            .email(1, false, &raw)
            .build();

        let output = run("A1", &seq_set(&[1]), &mailbox, Some("INBOX")).await;

        let literal = format!("{{{expected_len}}}");
        assert!(output.contains(&literal));
    }

    #[tokio::test]
    async fn out_of_range_sequence_returns_only_ok() {
        let mailbox = MailboxBuilder::new().folder("INBOX").build();

        let output = run("A1", &seq_set(&[99]), &mailbox, Some("INBOX")).await;

        assert!(!output.contains("FETCH (UID"));
        assert!(output.contains("A1 OK FETCH completed"));
    }

    #[tokio::test]
    async fn no_folder_selected_returns_bad() {
        let mailbox = MailboxBuilder::new().folder("INBOX").build();

        let output = run("A1", &seq_set(&[1]), &mailbox, None).await;

        assert!(output.contains("A1 BAD No folder selected"));
    }
}
