#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI that fetches unread mail from an IMAP mailbox and prints the
//! parsed records

use chrono::NaiveDate;
use clap::Parser;
use mailgrab::{ImapConfig, MailRecord, MailSession, SearchCriteria, SearchTerm};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mailgrab")]
#[command(
    about = "Fetch and parse unread mail from an IMAP mailbox"
)]
struct Args {
    /// Mailbox to open
    #[arg(long, default_value = "INBOX")]
    folder: String,

    /// Only messages whose Subject contains this text
    #[arg(long)]
    subject: Option<String>,

    /// Only messages received on or after this date (YYYY-MM-DD,
    /// default: today)
    #[arg(long, value_parser = parse_date)]
    since: Option<NaiveDate>,

    /// Include already-read messages
    #[arg(long)]
    seen: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{s}': {e}"))
}

fn build_criteria(args: &Args) -> SearchCriteria {
    let mut criteria = SearchCriteria::new();
    if !args.seen {
        criteria.push(SearchTerm::Unseen);
    }
    let since = args
        .since
        .unwrap_or_else(|| chrono::Utc::now().date_naive());
    criteria.push(SearchTerm::Since(since));
    if let Some(subject) = &args.subject {
        criteria.push(SearchTerm::Subject(subject.clone()));
    }
    criteria
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = ImapConfig::from_env()?;
    let mut session = MailSession::new(config);

    session.connect().await?;
    let box_name = session.open_box(&args.folder).await?;
    tracing::info!("Opened {box_name}");

    let criteria = build_criteria(&args);
    let records = session.fetch_mail(&criteria).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print_record_table(&records);
        for record in &records {
            print_record_detail(record);
        }
    }

    session.end().await?;
    Ok(())
}

fn print_record_table(records: &[MailRecord]) {
    if records.is_empty() {
        println!("No mail found.");
        return;
    }

    let header = format!(
        "{:<6} {:<8} {:<30} {}",
        "Seq", "UID", "From", "Subject"
    );
    println!("{header}");
    println!("{}", "-".repeat(90));

    for record in records {
        let uid = record
            .uid
            .map_or_else(|| "-".to_string(), |u| u.to_string());
        println!(
            "{:<6} {:<8} {:<30} {}",
            record.seqno,
            uid,
            truncate(record.from_address.as_deref().unwrap_or("-"), 28),
            truncate(record.subject.as_deref().unwrap_or("-"), 40),
        );
    }

    println!("\n{} message(s)", records.len());
}

fn print_record_detail(record: &MailRecord) {
    println!("\n=== Message {} ===", record.seqno);
    if let Some(name) = &record.from_name {
        println!("From:    {} <{}>", name, record.from_address.as_deref().unwrap_or("-"));
    } else {
        println!("From:    {}", record.from_address.as_deref().unwrap_or("-"));
    }
    if let Some(subject) = &record.subject {
        println!("Subject: {subject}");
    }
    if let Some(date) = &record.date {
        println!("Date:    {date}");
    }

    if let Some(body) = &record.body {
        println!("--- Body ---");
        for line in body.lines() {
            println!("{line}");
        }
    }

    for file in &record.files {
        println!(
            "--- Attachment: {} ({}, {} bytes) ---",
            file.original_name.as_deref().unwrap_or("unnamed"),
            file.mime_type,
            file.size,
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String =
            s.chars().take(max.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
