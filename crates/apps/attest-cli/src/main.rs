//! attest-cli - Command-line front end for attendance email retrieval
//!
//! Searches the signed-in mailbox for an event's confirmation emails the
//! same way the event detail view does, and prints what it finds.

use anyhow::{Context, Result};
use attest::session::DetachedSession;
use attest::{
    AttestConfig, Credential, DetailFetcher, GmailClient, MessageDetail, PaginationController,
    SearchClient, SessionGate,
};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "attest-cli", version, about = "Find event attendance emails in Gmail")]
struct Cli {
    /// Settings file to use instead of ~/.config/attest/attest.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search the mailbox for an event's emails
    Search(SearchArgs),
    /// Print the effective configuration
    Config {
        /// Write it to the settings file if none exists yet
        #[arg(long)]
        init: bool,
    },
}

#[derive(clap::Args)]
struct SearchArgs {
    /// Event name to match in the subject line
    #[arg(long)]
    event: String,

    /// Maximum number of pages to fetch
    #[arg(long, default_value_t = 1)]
    pages: usize,

    /// Also fetch and decode the raw message content
    #[arg(long)]
    raw: bool,

    /// OAuth access token for the Gmail API
    #[arg(long, env = "ATTEST_ACCESS_TOKEN", hide_env_values = true)]
    token: String,
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // Bootstrap config directory
    if let Err(e) = config::init() {
        warn!("Failed to initialize config directory: {}", e);
    }

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.config {
        Some(path) => AttestConfig::from_file(path)?,
        None => AttestConfig::load()?,
    };

    match cli.cmd {
        Command::Search(args) => search(&settings, args),
        Command::Config { init } => {
            let json = serde_json::to_string_pretty(&settings)?;
            println!("{}", json);

            let existing = AttestConfig::default_config_path().filter(|p| p.exists());
            match (init, existing) {
                (true, None) => info!("Wrote settings file: {}", settings.save()?.display()),
                (_, Some(path)) => info!("Settings file: {}", path.display()),
                (false, None) => info!("No settings file, using defaults"),
            }
            Ok(())
        }
    }
}

fn search(settings: &AttestConfig, args: SearchArgs) -> Result<()> {
    let client = Arc::new(GmailClient::with_base_url(
        &settings.api_base_url,
        settings.request_timeout(),
    ));
    let gate = Arc::new(SessionGate::new(
        Credential::authenticated(args.token),
        Arc::new(DetachedSession),
    ));
    let search = Arc::new(SearchClient::with_page_cap(
        client.clone(),
        settings.max_enriched_per_page,
    ));
    let fetcher = Arc::new(DetailFetcher::new(client, settings.detail_concurrency)?);

    let mut pages = PaginationController::fetch_all(
        search,
        fetcher,
        gate,
        settings.filter_for(&args.event),
    )
    .with_raw(args.raw);

    info!("Searching for {}", pages.filter());
    let fetched = pages
        .take_pages(args.pages.max(1))
        .map_err(|e| anyhow::anyhow!("{} ({})", e.user_message(), e))
        .context("Search failed")?;

    for page in &fetched {
        for entry in &page.degraded {
            warn!("{}: {}", entry.id, entry.reason);
        }
    }

    if pages.messages().is_empty() {
        println!("No emails found.");
        return Ok(());
    }

    for message in pages.messages() {
        print_message(message);
    }
    if pages.has_more() {
        println!("(more results available, use --pages to fetch further)");
    }

    Ok(())
}

fn print_message(message: &MessageDetail) {
    let sent = message
        .summary
        .sent_at()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| message.date().to_string());
    println!("{}  {:<16}  {}", message.id(), sent, message.subject());
    if let Some(raw) = &message.raw {
        println!("    {} bytes of raw content", raw.len());
    }
}
